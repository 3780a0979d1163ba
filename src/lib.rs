//! SkillSwap listing search service
//!
//! Filters marketplace listings by type, location and skills, with an optional
//! ZIP code proximity post-filter backed by an external geocoding service.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{SearchService, SearchOptions, SearchError, ListingFilter, ProximityFilter, distance::haversine_miles};
pub use crate::models::{Listing, ListingType, Coordinate, SearchCriteria, SearchParams, ListingResponse};
