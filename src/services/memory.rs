use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use crate::core::{
    distance::{calculate_bounding_box, distance_between, is_within_bounding_box},
    filters::matches_predicate,
};
use crate::models::{Address, AddressKind, AddressPredicate, Coordinates, User, UserId};
use crate::services::store::{AddressStore, StoreError};

/// How the in-memory store answers radius queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialSupport {
    Available,
    /// Capability check reports no spatial support
    Missing,
    /// Capability check passes but radius queries fail
    Broken,
}

/// Address store held in process memory
///
/// Used by the test suites and for running the service without Postgres.
/// Radius queries pre-filter with a bounding box and only compute exact
/// distances for points inside it.
pub struct InMemoryStore {
    users: RwLock<BTreeMap<UserId, User>>,
    spatial: SpatialSupport,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_spatial_support(SpatialSupport::Available)
    }

    pub fn with_spatial_support(spatial: SpatialSupport) -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            spatial,
        }
    }

    /// Seed the store with users
    pub fn with_users(mut self, users: impl IntoIterator<Item = User>) -> Self {
        {
            let map = self.users.get_mut();
            for user in users {
                map.insert(user.id, user);
            }
        }
        self
    }

    /// Insert or replace a user
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn get_user_with_addresses(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_users_by_predicate(
        &self,
        predicate: &AddressPredicate,
        exclude_id: UserId,
    ) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;

        Ok(users
            .values()
            .filter(|user| user.id != exclude_id)
            .filter(|user| matches_predicate(user, predicate))
            .cloned()
            .collect())
    }

    async fn find_users_within_radius(
        &self,
        center: Coordinates,
        radius_meters: f64,
        exclude_id: UserId,
        kind: AddressKind,
        limit: usize,
    ) -> Result<Vec<(User, f64)>, StoreError> {
        if self.spatial == SpatialSupport::Broken {
            return Err(StoreError::SpatialUnavailable(
                "radius query backend is not responding".to_string(),
            ));
        }

        let bbox = calculate_bounding_box(center.latitude, center.longitude, radius_meters);
        let users = self.users.read().await;

        let mut hits: Vec<(User, f64)> = users
            .values()
            .filter(|user| user.id != exclude_id)
            .filter_map(|user| {
                let point = user.address(kind)?.coordinates?;
                if !is_within_bounding_box(point.latitude, point.longitude, &bbox) {
                    return None;
                }
                let meters = distance_between(center, point);
                (meters <= radius_meters).then(|| (user.clone(), meters))
            })
            .collect();

        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        hits.truncate(limit);

        Ok(hits)
    }

    fn spatial_search_available(&self) -> bool {
        self.spatial != SpatialSupport::Missing
    }

    async fn upsert_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        address: &Address,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;

        let slot = match kind {
            AddressKind::Home => &mut user.home_address,
            AddressKind::Company => &mut user.company_address,
        };
        *slot = Some(address.clone());

        Ok(())
    }

    async fn set_coordinates_if_unchanged(
        &self,
        user_id: UserId,
        kind: AddressKind,
        expected: &Address,
        coordinates: Coordinates,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        let current = users.get_mut(&user_id).and_then(|user| match kind {
            AddressKind::Home => user.home_address.as_mut(),
            AddressKind::Company => user.company_address.as_mut(),
        });

        match current {
            Some(address) if address.same_location_text(expected) => {
                address.coordinates = Some(coordinates);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_ungeocoded_addresses(
        &self,
        limit: usize,
    ) -> Result<Vec<(UserId, AddressKind, Address)>, StoreError> {
        let users = self.users.read().await;

        Ok(users
            .values()
            .flat_map(|user| {
                [AddressKind::Home, AddressKind::Company]
                    .into_iter()
                    .filter_map(move |kind| {
                        user.address(kind)
                            .filter(|a| a.coordinates.is_none() && !a.is_blank())
                            .map(|a| (user.id, kind, a.clone()))
                    })
            })
            .take(limit)
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
