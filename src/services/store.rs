use async_trait::async_trait;
use thiserror::Error;
use crate::models::{Address, AddressKind, AddressPredicate, Coordinates, User, UserId};

/// Errors that can occur when reading or writing addresses
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Spatial search unavailable: {0}")]
    SpatialUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Persistence collaborator of the matching engine
///
/// Every query that returns users loads both addresses. Queries that take an
/// `exclude_id` never return that user.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Load one user with both addresses
    async fn get_user_with_addresses(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Users whose company address satisfies `predicate`, ordered by id
    async fn find_users_by_predicate(
        &self,
        predicate: &AddressPredicate,
        exclude_id: UserId,
    ) -> Result<Vec<User>, StoreError>;

    /// Users whose `kind` address lies within `radius_meters` of `center`
    ///
    /// Results are ordered by ascending distance (meters, returned alongside)
    /// and hold at most `limit` entries.
    async fn find_users_within_radius(
        &self,
        center: Coordinates,
        radius_meters: f64,
        exclude_id: UserId,
        kind: AddressKind,
        limit: usize,
    ) -> Result<Vec<(User, f64)>, StoreError>;

    /// Whether radius queries are supported by the backend
    fn spatial_search_available(&self) -> bool;

    /// Create or replace one address of a user
    async fn upsert_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        address: &Address,
    ) -> Result<(), StoreError>;

    /// Store `coordinates` on an address whose locating text still equals `expected`
    ///
    /// Returns `false` without writing when the address is gone or its street,
    /// city or zipcode changed since `expected` was read.
    async fn set_coordinates_if_unchanged(
        &self,
        user_id: UserId,
        kind: AddressKind,
        expected: &Address,
        coordinates: Coordinates,
    ) -> Result<bool, StoreError>;

    /// Addresses that have locating text but no coordinates, oldest user first
    async fn find_ungeocoded_addresses(
        &self,
        limit: usize,
    ) -> Result<Vec<(UserId, AddressKind, Address)>, StoreError>;

    /// Health check for the backing store
    async fn health_check(&self) -> Result<bool, StoreError>;
}
