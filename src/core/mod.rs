// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod ranking;
pub mod scoring;
pub mod selector;

pub use distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box, meters_to_miles, miles_to_meters};
pub use filters::{matches_predicate, same_field};
pub use matcher::{Matcher, MatchResult};
pub use ranking::rank;
pub use scoring::calculate_match_score;
pub use selector::CandidateSelector;
