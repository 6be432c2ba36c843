// Service exports
pub mod addresses;
pub mod geocoder;
pub mod memory;
pub mod postgres;
pub mod rate_limit;
pub mod store;

pub use addresses::AddressService;
pub use geocoder::{geocode_batch, AddressQuery, GeocodeError, Geocoder, NominatimGeocoder};
pub use memory::{InMemoryStore, SpatialSupport};
pub use postgres::PostgresStore;
pub use rate_limit::RateLimiter;
pub use store::{AddressStore, StoreError};
