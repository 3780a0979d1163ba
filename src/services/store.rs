use crate::core::ListingFilter;
use crate::models::{Listing, NewListing};
use std::future::Future;
use thiserror::Error;

/// Errors that can occur when reading or writing listings
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Listing storage supporting predicate-based retrieval
pub trait ListingStore: Send + Sync {
    /// Listings matching every predicate of `filter`, newest first (ties by id, descending)
    fn find_listings(
        &self,
        filter: &ListingFilter,
    ) -> impl Future<Output = Result<Vec<Listing>, StoreError>> + Send;

    fn get_listing(&self, id: i64) -> impl Future<Output = Result<Option<Listing>, StoreError>> + Send;

    fn insert_listing(&self, listing: NewListing) -> impl Future<Output = Result<Listing, StoreError>> + Send;

    /// Round-trip to the backing store
    fn health_check(&self) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
