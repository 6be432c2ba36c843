// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Address, AddressKind, AddressPredicate, BoundingBox, Candidate, Coordinates, MatchReasons,
    MatchSettings, ModeWeights, RankedMatch, ScoredCandidate, SearchMode, User, UserId,
};
pub use requests::{AddressInput, BackfillQuery, SearchQuery, UpdateAddressesRequest};
pub use responses::{
    AddressesResponse, BackfillResponse, CompanyAddressView, ErrorResponse, HealthResponse,
    HomeAddressView, MatchSummary,
};
