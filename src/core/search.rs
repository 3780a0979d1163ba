use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

use crate::core::filters::ListingFilter;
use crate::core::proximity::{ProximityError, ProximityFilter};
use crate::models::{ErrorResponse, FieldErrors, Listing, ListingResponse, PageLimits, SearchCriteria, SearchParams};
use crate::services::{Geocoder, ListingStore, StoreError};

/// Message returned for any failure that is not the caller's fault
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred while searching listings";
pub const INVALID_ZIP_MESSAGE: &str = "Invalid ZIP code for proximity filtering.";

/// Errors produced by a search invocation
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search parameters: {0}")]
    Validation(FieldErrors),

    #[error("Invalid reference ZIP code: {0}")]
    InvalidReferenceZip(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("Search timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ProximityError> for SearchError {
    fn from(err: ProximityError) -> Self {
        match err {
            ProximityError::InvalidReference(zip) => SearchError::InvalidReferenceZip(zip),
        }
    }
}

impl ResponseError for SearchError {
    fn status_code(&self) -> StatusCode {
        match self {
            SearchError::Validation(_) | SearchError::InvalidReferenceZip(_) => StatusCode::BAD_REQUEST,
            SearchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            SearchError::Validation(fields) => {
                ErrorResponse::with_fields("Invalid search parameters", fields.clone())
            }
            SearchError::InvalidReferenceZip(_) => ErrorResponse::new(INVALID_ZIP_MESSAGE),
            SearchError::Storage(e) => {
                tracing::error!("Listing search failed: {}", e);
                ErrorResponse::new(INTERNAL_ERROR_MESSAGE)
            }
            SearchError::Timeout(_) => ErrorResponse::new("Search timed out"),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Explicit configuration handed to the orchestrator at construction
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub page_limits: PageLimits,
    /// Deadline for geocoding the proximity candidates
    pub request_timeout: Duration,
    /// Public path prefix for uploaded listing images
    pub image_base_path: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page_limits: PageLimits::default(),
            request_timeout: Duration::from_secs(10),
            image_base_path: "/static/uploads".to_string(),
        }
    }
}

/// Search orchestrator
///
/// # Pipeline
/// 1. Validate raw parameters into `SearchCriteria`
/// 2. Build the `ListingFilter` and query storage
/// 3. Proximity post-filter when a reference ZIP and radius are present
/// 4. Paginate (only when requested) and shape the response
///
/// Holds no per-request state; concurrent invocations are independent.
pub struct SearchService<S, G> {
    store: S,
    geocoder: G,
    proximity: ProximityFilter,
    options: SearchOptions,
}

impl<S: ListingStore, G: Geocoder> SearchService<S, G> {
    pub fn new(store: S, geocoder: G, proximity: ProximityFilter, options: SearchOptions) -> Self {
        Self {
            store,
            geocoder,
            proximity,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Validate raw query parameters, then search
    pub async fn search_params(&self, params: &SearchParams) -> Result<Vec<ListingResponse>, SearchError> {
        let criteria = params
            .to_criteria(self.options.page_limits)
            .map_err(SearchError::Validation)?;
        self.search(&criteria).await
    }

    /// Run a validated search
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ListingResponse>, SearchError> {
        let span = tracing::info_span!(
            "listing_search",
            request_id = %uuid::Uuid::new_v4(),
            proximity = criteria.proximity.is_some(),
            candidates = tracing::field::Empty,
            results = tracing::field::Empty,
        );

        async move {
            let listings = self.matching_listings(criteria).await?;

            let listings = match criteria.pagination {
                Some(page) => page.apply(listings),
                None => listings,
            };

            tracing::Span::current().record("results", listings.len() as u64);
            tracing::info!("Search returned {} listings", listings.len());

            Ok(listings
                .into_iter()
                .map(|listing| self.present(listing))
                .collect())
        }
        .instrument(span)
        .await
    }

    /// Filter + optional proximity stage, unpaginated
    pub async fn matching_listings(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>, SearchError> {
        let filter = ListingFilter::from_criteria(criteria);
        let candidates = self.store.find_listings(&filter).await?;

        tracing::Span::current().record("candidates", candidates.len() as u64);
        tracing::debug!("Filter matched {} candidates", candidates.len());

        let Some(proximity) = &criteria.proximity else {
            return Ok(candidates);
        };

        // The deadline covers candidate lookups only; the reference has its own lookup timeout
        let reference = self
            .proximity
            .resolve_reference(&self.geocoder, &proximity.reference_zip)
            .await?;

        let stage = self.proximity.filter_candidates(
            &self.geocoder,
            reference,
            proximity.radius_miles,
            candidates,
        );

        match tokio::time::timeout(self.options.request_timeout, stage).await {
            Ok(kept) => Ok(kept),
            Err(_) => {
                tracing::warn!(
                    "Proximity search around {} exceeded {:?}",
                    proximity.reference_zip,
                    self.options.request_timeout
                );
                Err(SearchError::Timeout(self.options.request_timeout))
            }
        }
    }

    /// Shape a stored listing for the wire
    pub fn present(&self, listing: Listing) -> ListingResponse {
        ListingResponse::from_listing(listing, &self.options.image_base_path)
    }
}
