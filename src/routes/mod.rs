// Route exports
pub mod listings;

use actix_web::{error, web, HttpResponse};
use crate::models::ErrorResponse;
use crate::services::{Geocoder, ListingStore};

pub use listings::AppState;

pub fn configure_routes<S, G>(cfg: &mut web::ServiceConfig)
where
    S: ListingStore + 'static,
    G: Geocoder + 'static,
{
    cfg.service(
        web::scope("/api/v1")
            .configure(listings::configure::<S, G>),
    );
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ErrorResponse::new(format!("Invalid JSON: {}", err)));
    error::InternalError::from_response(err, response).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ErrorResponse::new(format!("Invalid query: {}", err)));
    error::InternalError::from_response(err, response).into()
}
