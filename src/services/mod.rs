// Service exports
pub mod cache;
pub mod geocoder;
pub mod postgres;
pub mod store;

pub use cache::{CacheManager, CacheKey, CacheError};
pub use geocoder::{Geocoder, GeocodeError, HttpGeocoder, CachedGeocoder, AnyGeocoder};
pub use postgres::PostgresClient;
pub use store::{ListingStore, StoreError};
