use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::search::{SearchError, INTERNAL_ERROR_MESSAGE};
use crate::core::SearchService;
use crate::models::{CreateListingRequest, CreateListingResponse, ErrorResponse, HealthResponse, NewListing, SearchParams};
use crate::services::{Geocoder, ListingStore};

/// Application state shared across all handlers
pub struct AppState<S, G> {
    pub search: Arc<SearchService<S, G>>,
}

impl<S, G> Clone for AppState<S, G> {
    fn clone(&self) -> Self {
        Self {
            search: Arc::clone(&self.search),
        }
    }
}

/// Configure all listing-related routes
pub fn configure<S, G>(cfg: &mut web::ServiceConfig)
where
    S: ListingStore + 'static,
    G: Geocoder + 'static,
{
    cfg
        .route("/health", web::get().to(health_check::<S, G>))
        .route("/listings/search", web::get().to(search_listings::<S, G>))
        .route("/listings", web::get().to(get_all_listings::<S, G>))
        .route("/listings", web::post().to(create_listing::<S, G>))
        .route("/listings/{id}", web::get().to(get_listing::<S, G>));
}

/// Health check endpoint
async fn health_check<S: ListingStore, G: Geocoder>(state: web::Data<AppState<S, G>>) -> impl Responder {
    let healthy = match state.search.store().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Search listings endpoint
///
/// GET /api/v1/listings/search?type=job&city=austin&wanted_skill=5&zip_code=78701&proximity=10
///
/// All parameters are optional. `zip_code` + `proximity` restricts results to
/// listings within `proximity` miles of `zip_code`; `page` / `per_page`
/// paginate the final sequence.
async fn search_listings<S: ListingStore, G: Geocoder>(
    state: web::Data<AppState<S, G>>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, SearchError> {
    let results = state.search.search_params(&query).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// All listings, newest first
///
/// GET /api/v1/listings
async fn get_all_listings<S: ListingStore, G: Geocoder>(
    state: web::Data<AppState<S, G>>,
) -> Result<HttpResponse, SearchError> {
    let results = state.search.search(&Default::default()).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Single listing by id
///
/// GET /api/v1/listings/{id}
async fn get_listing<S: ListingStore, G: Geocoder>(
    state: web::Data<AppState<S, G>>,
    path: web::Path<i64>,
) -> impl Responder {
    let id = path.into_inner();

    match state.search.store().get_listing(id).await {
        Ok(Some(listing)) => HttpResponse::Ok().json(state.search.present(listing)),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::new("Listing not found")),
        Err(e) => {
            tracing::error!("Failed to fetch listing {}: {}", id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(INTERNAL_ERROR_MESSAGE))
        }
    }
}

/// Create listing endpoint
///
/// POST /api/v1/listings
///
/// Request body:
/// ```json
/// {
///   "user_id": 1,
///   "title": "string",
///   "description": "string",
///   "city": "string",
///   "state": "string",
///   "zip_code": "string",
///   "type": "job|skill_exchange",
///   "offered_skill": 2,
///   "wanted_skill": 5,
///   "image": "file.png"
/// }
/// ```
async fn create_listing<S: ListingStore, G: Geocoder>(
    state: web::Data<AppState<S, G>>,
    req: web::Json<CreateListingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for create_listing request: {}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new(errors.to_string()));
    }

    let new_listing = NewListing::from(req.into_inner());

    match state.search.store().insert_listing(new_listing).await {
        Ok(listing) => {
            tracing::info!("Created listing {} ({})", listing.id, listing.listing_type);
            HttpResponse::Created().json(CreateListingResponse {
                message: "Listing created successfully".to_string(),
                listing: state.search.present(listing),
            })
        }
        Err(e) => {
            tracing::error!("Failed to create listing: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("An error occurred while creating the listing"))
        }
    }
}
