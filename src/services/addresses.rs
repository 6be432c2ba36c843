use std::sync::Arc;
use crate::models::{
    Address, AddressInput, AddressKind, AddressesResponse, BackfillResponse, UpdateAddressesRequest,
    UserId,
};
use crate::services::geocoder::{geocode_batch, AddressQuery, Geocoder};
use crate::services::store::{AddressStore, StoreError};

/// Writes addresses and keeps their coordinates in step with the text
///
/// Coordinates are recomputed only when the address text changed; an
/// unchanged, already geocoded address keeps its stored point and costs no
/// geocoding call. A failed lookup stores the address without coordinates.
pub struct AddressService {
    store: Arc<dyn AddressStore>,
    geocoder: Arc<dyn Geocoder>,
}

impl AddressService {
    pub fn new(store: Arc<dyn AddressStore>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    /// Replace the submitted addresses of a user
    pub async fn update_addresses(
        &self,
        user_id: UserId,
        request: UpdateAddressesRequest,
    ) -> Result<AddressesResponse, StoreError> {
        let user = self
            .store
            .get_user_with_addresses(user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;

        let mut home_address = user.home_address;
        let mut company_address = user.company_address;

        if let Some(input) = request.home_address {
            let address = self.write_address(user_id, AddressKind::Home, input, home_address.as_ref()).await?;
            home_address = Some(address);
        }

        if let Some(input) = request.company_address {
            let address = self
                .write_address(user_id, AddressKind::Company, input, company_address.as_ref())
                .await?;
            company_address = Some(address);
        }

        Ok(AddressesResponse {
            home_address,
            company_address,
        })
    }

    async fn write_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        input: AddressInput,
        current: Option<&Address>,
    ) -> Result<Address, StoreError> {
        let mut address = input.into_address();
        if kind == AddressKind::Home {
            address.office_name = None;
        }

        address.coordinates = match current {
            Some(existing) if existing.same_location_text(&address) && existing.coordinates.is_some() => {
                existing.coordinates
            }
            _ if address.is_blank() => None,
            _ => self.geocoder.geocode(&AddressQuery::from_address(&address)).await,
        };

        if address.coordinates.is_none() && !address.is_blank() {
            tracing::warn!(
                "Storing {} address for user {} without coordinates",
                kind,
                user_id
            );
        }

        self.store.upsert_address(user_id, kind, &address).await?;

        tracing::info!(
            "Updated {} address for user {} (geocoded: {})",
            kind,
            user_id,
            address.coordinates.is_some()
        );

        Ok(address)
    }

    /// Geocode up to `limit` stored addresses that have no coordinates yet
    pub async fn backfill_coordinates(&self, limit: usize) -> Result<BackfillResponse, StoreError> {
        let pending = self.store.find_ungeocoded_addresses(limit).await?;
        let queries: Vec<AddressQuery> = pending
            .iter()
            .map(|(_, _, address)| AddressQuery::from_address(address))
            .collect();

        let results = geocode_batch(self.geocoder.as_ref(), &queries).await;

        let mut geocoded = 0;
        for ((user_id, kind, address), coordinates) in pending.into_iter().zip(results) {
            let Some(point) = coordinates else {
                continue;
            };

            if self
                .store
                .set_coordinates_if_unchanged(user_id, kind, &address, point)
                .await?
            {
                geocoded += 1;
            } else {
                tracing::debug!(
                    "Skipped backfill of {} address for user {}: edited during lookup",
                    kind,
                    user_id
                );
            }
        }

        tracing::info!(
            "Coordinate backfill geocoded {} of {} addresses",
            geocoded,
            queries.len()
        );

        Ok(BackfillResponse {
            examined: queries.len(),
            geocoded,
        })
    }
}
