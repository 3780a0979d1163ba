// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod proximity;
pub mod search;

pub use distance::{haversine_miles, is_within_radius};
pub use filters::{ListingFilter, like_pattern};
pub use proximity::{ProximityFilter, ProximityError};
pub use search::{SearchService, SearchOptions, SearchError};
