use crate::core::{distance::miles_to_meters, filters::field};
use crate::error::{PreconditionFailure, SearchError};
use crate::models::{Address, AddressPredicate, Candidate, MatchSettings, SearchMode, User};
use crate::services::{AddressStore, StoreError};

/// Builds the raw candidate pool for a search
///
/// # Pool per mode
/// - `office` / `street` / `city`: exact, case-insensitive company address match
/// - `all`: 10-mile radius over company coordinates when both the searcher's
///   coordinates and spatial search are available, otherwise city match,
///   otherwise everyone with a company address
/// - `nearbyHome` / `nearbyWork`: caller-sized radius over home or company
///   coordinates
///
/// Radius pools are ordered by ascending distance and capped before scoring.
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    raw_candidate_cap: usize,
    all_radius_meters: f64,
    default_nearby_radius_miles: f64,
    max_nearby_radius_miles: f64,
}

impl CandidateSelector {
    pub fn new(settings: &MatchSettings) -> Self {
        Self {
            raw_candidate_cap: settings.raw_candidate_cap,
            all_radius_meters: settings.all_radius_meters,
            default_nearby_radius_miles: settings.default_nearby_radius_miles,
            max_nearby_radius_miles: settings.max_nearby_radius_miles,
        }
    }

    pub async fn select_candidates(
        &self,
        store: &dyn AddressStore,
        searcher: &User,
        mode: SearchMode,
        radius_miles: Option<f64>,
    ) -> Result<Vec<Candidate>, SearchError> {
        let required = mode.required_address();
        let address = searcher
            .address(required)
            .ok_or(SearchError::Precondition(PreconditionFailure::AddressNotSet(required)))?;

        let candidates = match mode {
            SearchMode::Office | SearchMode::Street | SearchMode::City => {
                let predicate = exact_predicate(address, mode)?;
                self.by_predicate(store, searcher, &predicate).await?
            }
            SearchMode::All => {
                let radius_hits = match address.coordinates {
                    Some(center) if store.spatial_search_available() => {
                        let result = store
                            .find_users_within_radius(
                                center,
                                self.all_radius_meters,
                                searcher.id,
                                required,
                                self.raw_candidate_cap,
                            )
                            .await;
                        match result {
                            Ok(hits) => Some(hits),
                            Err(StoreError::SpatialUnavailable(detail)) => {
                                tracing::warn!(
                                    "Radius query failed for user {}, using exact matching: {}",
                                    searcher.id,
                                    detail
                                );
                                None
                            }
                            Err(e) => return Err(e.into()),
                        }
                    }
                    _ => {
                        tracing::debug!(
                            "Falling back to exact matching for user {} (geocoded: {}, spatial: {})",
                            searcher.id,
                            address.coordinates.is_some(),
                            store.spatial_search_available()
                        );
                        None
                    }
                };

                match radius_hits {
                    Some(hits) => self.from_radius(searcher, hits),
                    None => {
                        let predicate = fallback_predicate(address);
                        self.by_predicate(store, searcher, &predicate).await?
                    }
                }
            }
            SearchMode::NearbyHome | SearchMode::NearbyWork => {
                let center = address.coordinates.ok_or(SearchError::Precondition(
                    PreconditionFailure::AddressNotGeocoded(required),
                ))?;

                if !store.spatial_search_available() {
                    return Err(SearchError::ServiceUnavailable(
                        "spatial search is not enabled on the address store".to_string(),
                    ));
                }

                let miles = radius_miles.unwrap_or(self.default_nearby_radius_miles);
                if !miles.is_finite() || miles <= 0.0 || miles > self.max_nearby_radius_miles {
                    return Err(SearchError::Validation(format!(
                        "Radius must be greater than 0 and at most {} miles",
                        self.max_nearby_radius_miles
                    )));
                }

                let radius_meters = miles_to_meters(miles);
                let hits = store
                    .find_users_within_radius(
                        center,
                        radius_meters,
                        searcher.id,
                        required,
                        self.raw_candidate_cap,
                    )
                    .await?;
                self.from_radius(searcher, hits)
            }
        };

        tracing::debug!(
            "Selected {} candidates for user {} in {} mode",
            candidates.len(),
            searcher.id,
            mode
        );

        Ok(candidates)
    }

    async fn by_predicate(
        &self,
        store: &dyn AddressStore,
        searcher: &User,
        predicate: &AddressPredicate,
    ) -> Result<Vec<Candidate>, SearchError> {
        let users = store.find_users_by_predicate(predicate, searcher.id).await?;

        Ok(users
            .into_iter()
            .filter(|user| user.id != searcher.id)
            .map(|user| Candidate {
                user,
                distance_meters: None,
            })
            .collect())
    }

    fn from_radius(&self, searcher: &User, hits: Vec<(User, f64)>) -> Vec<Candidate> {
        hits.into_iter()
            .filter(|(user, _)| user.id != searcher.id)
            .take(self.raw_candidate_cap)
            .map(|(user, meters)| Candidate {
                user,
                distance_meters: Some(meters),
            })
            .collect()
    }
}

/// Predicate for the exact-match modes, built from the searcher's company address
pub fn exact_predicate(
    company: &Address,
    mode: SearchMode,
) -> Result<AddressPredicate, SearchError> {
    match mode {
        SearchMode::Office => field(&company.office_name)
            .map(|name| AddressPredicate::OfficeName(name.to_string()))
            .ok_or_else(|| SearchError::Validation("Office name not set in your profile".into())),
        SearchMode::Street => field(&company.street)
            .map(|street| AddressPredicate::StreetAndCity {
                street: street.to_string(),
                city: field(&company.city).map(String::from),
            })
            .ok_or_else(|| {
                SearchError::Validation("Street address not set in your profile".into())
            }),
        SearchMode::City => field(&company.city)
            .map(|city| AddressPredicate::City(city.to_string()))
            .ok_or_else(|| SearchError::Validation("City not set in your profile".into())),
        other => Err(SearchError::Validation(format!(
            "Search type '{}' does not use exact address matching",
            other
        ))),
    }
}

/// Pool for `all` when a radius query is not possible
pub fn fallback_predicate(company: &Address) -> AddressPredicate {
    match field(&company.city) {
        Some(city) => AddressPredicate::City(city.to_string()),
        None => AddressPredicate::HasCompanyAddress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(office: Option<&str>, street: Option<&str>, city: Option<&str>) -> Address {
        Address {
            office_name: office.map(String::from),
            street: street.map(String::from),
            city: city.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_office_predicate_requires_office_name() {
        let err = exact_predicate(&company(None, Some("1 Main"), Some("Austin")), SearchMode::Office)
            .unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));

        let predicate =
            exact_predicate(&company(Some("Acme Corp"), None, None), SearchMode::Office).unwrap();
        assert_eq!(predicate, AddressPredicate::OfficeName("Acme Corp".into()));
    }

    #[test]
    fn test_street_predicate_carries_city() {
        let predicate = exact_predicate(
            &company(None, Some("500 Congress Ave"), Some("Austin")),
            SearchMode::Street,
        )
        .unwrap();
        assert_eq!(
            predicate,
            AddressPredicate::StreetAndCity {
                street: "500 Congress Ave".into(),
                city: Some("Austin".into()),
            }
        );

        let err = exact_predicate(&company(None, Some("  "), Some("Austin")), SearchMode::Street)
            .unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
    }

    #[test]
    fn test_city_predicate_requires_city() {
        assert!(exact_predicate(&company(None, None, None), SearchMode::City).is_err());
    }

    #[test]
    fn test_fallback_predicate() {
        assert_eq!(
            fallback_predicate(&company(None, None, Some("Austin"))),
            AddressPredicate::City("Austin".into())
        );
        assert_eq!(
            fallback_predicate(&company(Some("Acme"), None, None)),
            AddressPredicate::HasCompanyAddress
        );
    }
}
