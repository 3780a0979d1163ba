use serde::{Deserialize, Serialize};
use crate::models::domain::{Listing, ListingType};
use crate::models::requests::FieldErrors;

/// Listing as returned to API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub offered_skill: Option<i64>,
    pub wanted_skill: Option<i64>,
    /// Public path of the uploaded image
    pub image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ListingResponse {
    /// Shape a stored listing, resolving its image file name under `image_base_path`
    pub fn from_listing(listing: Listing, image_base_path: &str) -> Self {
        let image = listing
            .image
            .filter(|name| !name.is_empty())
            .map(|name| {
                format!(
                    "{}/{}",
                    image_base_path.trim_end_matches('/'),
                    name.trim_start_matches('/')
                )
            });

        Self {
            id: listing.id,
            user_id: listing.user_id,
            title: listing.title,
            description: listing.description,
            city: listing.city,
            state: listing.state,
            zip_code: listing.zip_code,
            listing_type: listing.listing_type,
            offered_skill: listing.offered_skill,
            wanted_skill: listing.wanted_skill,
            image,
            created_at: listing.created_at,
        }
    }
}

/// Response for the create listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListingResponse {
    pub message: String,
    pub listing: ListingResponse,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error payload: `{"error": "..."}` with optional per-field messages
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }

    pub fn with_fields(error: impl Into<String>, fields: FieldErrors) -> Self {
        Self {
            error: error.into(),
            fields: Some(fields),
        }
    }
}
