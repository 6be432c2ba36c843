//! Carpool Match - commute partner matching service
//!
//! Finds the users whose home and work addresses best line up with a
//! searcher's, either by exact address fields or by a geospatial radius
//! query, and ranks them with a fixed point table.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, MatchResult, distance::{haversine_distance, calculate_bounding_box}};
pub use error::{PreconditionFailure, SearchError};
pub use models::{Address, AddressKind, Coordinates, MatchReasons, MatchSummary, SearchMode, User};
pub use services::{AddressStore, InMemoryStore, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let bbox = calculate_bounding_box(30.2672, -97.7431, 16_093.44);
        assert!(bbox.min_lat < 30.2672);
        assert!(haversine_distance(30.2672, -97.7431, 30.2672, -97.7431) < 1e-6);
    }
}
