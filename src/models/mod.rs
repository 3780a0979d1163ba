// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Listing, ListingType, NewListing, Coordinate, Proximity, Pagination, SearchCriteria, check_listing_skills};
pub use requests::{SearchParams, PageLimits, FieldErrors, CreateListingRequest};
pub use responses::{ListingResponse, CreateListingResponse, HealthResponse, ErrorResponse};
