use crate::models::Coordinate;
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when resolving a postal code
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Geocoding service returned {0}")]
    ApiError(StatusCode),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Geocoding timed out after {0:?}")]
    Timeout(Duration),
}

impl GeocodeError {
    /// Transport failures, throttling and 5xx responses are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            GeocodeError::RequestError(_) | GeocodeError::Timeout(_) => true,
            GeocodeError::ApiError(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            GeocodeError::InvalidResponse(_) => false,
        }
    }
}

/// Resolves a postal code to a representative coordinate.
///
/// `Ok(None)` means the service answered and does not know the code.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        postal_code: &str,
    ) -> impl Future<Output = Result<Option<Coordinate>, GeocodeError>> + Send;
}

impl<G: Geocoder> Geocoder for Arc<G> {
    async fn geocode(&self, postal_code: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.as_ref().geocode(postal_code).await
    }
}

/// Geocoder backed by a Zippopotam-compatible HTTP API
///
/// `GET {base_url}/{country}/{postal_code}` answers 200 with a `places`
/// array carrying `latitude`/`longitude`, or 404 for unknown codes.
pub struct HttpGeocoder {
    base_url: String,
    country: String,
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpGeocoder {
    /// Create a new geocoding client
    pub fn new(
        base_url: String,
        country: String,
        request_timeout: Duration,
        max_retries: u32,
        backoff: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            base_url,
            country: country.to_lowercase(),
            client,
            max_retries,
            backoff,
        })
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    fn lookup_url(&self, postal_code: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.country),
            urlencoding::encode(postal_code)
        )
    }

    /// Single request without retries
    async fn lookup_once(&self, postal_code: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let url = self.lookup_url(postal_code);
        tracing::trace!("Geocoding {} via {}", postal_code, url);

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(GeocodeError::ApiError(status)),
            _ => {}
        }

        let json: Value = response.json().await?;
        parse_first_place(&json)
    }
}

impl Geocoder for HttpGeocoder {
    async fn geocode(&self, postal_code: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let postal_code = postal_code.trim();
        if postal_code.is_empty() {
            return Ok(None);
        }

        let mut attempt = 0;
        loop {
            match self.lookup_once(postal_code).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    tracing::warn!(
                        "Geocoding {} failed (attempt {}): {}, retrying in {:?}",
                        postal_code,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Extract the first place's coordinate; numbers may be encoded as strings
fn parse_first_place(json: &Value) -> Result<Option<Coordinate>, GeocodeError> {
    let places = match json.get("places").and_then(|p| p.as_array()) {
        Some(places) => places,
        None => return Ok(None),
    };

    let place = match places.first() {
        Some(place) => place,
        None => return Ok(None),
    };

    let latitude = coordinate_field(place, "latitude")?;
    let longitude = coordinate_field(place, "longitude")?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeocodeError::InvalidResponse(format!(
            "Coordinate out of range: {}, {}",
            latitude, longitude
        )));
    }

    Ok(Some(Coordinate::new(latitude, longitude)))
}

fn coordinate_field(place: &Value, name: &str) -> Result<f64, GeocodeError> {
    let value = place
        .get(name)
        .ok_or_else(|| GeocodeError::InvalidResponse(format!("Missing {}", name)))?;

    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| GeocodeError::InvalidResponse(format!("Invalid {}: {}", name, value)))
}

/// Memoizing wrapper around another geocoder.
///
/// Both hits and confirmed "not found" answers are cached; errors are not.
/// Cache failures fall back to the wrapped geocoder.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Arc<CacheManager>,
    country: String,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, cache: Arc<CacheManager>, country: impl Into<String>) -> Self {
        Self {
            inner,
            cache,
            country: country.into(),
        }
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, postal_code: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let postal_code = postal_code.trim();
        let key = CacheKey::geocode(&self.country, postal_code);

        match self.cache.get::<Option<Coordinate>>(&key).await {
            Ok(cached) => return Ok(cached),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Geocode cache read failed for {}: {}", key, e),
        }

        let resolved = self.inner.geocode(postal_code).await?;

        if let Err(e) = self.cache.set(&key, &resolved).await {
            tracing::warn!("Geocode cache write failed for {}: {}", key, e);
        }

        Ok(resolved)
    }
}

/// Geocoder selected at startup
pub enum AnyGeocoder {
    Direct(HttpGeocoder),
    Cached(CachedGeocoder<HttpGeocoder>),
}

impl Geocoder for AnyGeocoder {
    async fn geocode(&self, postal_code: &str) -> Result<Option<Coordinate>, GeocodeError> {
        match self {
            AnyGeocoder::Direct(g) => g.geocode(postal_code).await,
            AnyGeocoder::Cached(g) => g.geocode(postal_code).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoder(base_url: String, max_retries: u32) -> HttpGeocoder {
        HttpGeocoder::new(
            base_url,
            "US".to_string(),
            Duration::from_secs(5),
            max_retries,
            Duration::from_millis(1),
        )
        .expect("Failed to create geocoder")
    }

    #[test]
    fn test_lookup_url_encodes_segments() {
        let g = geocoder("https://api.zippopotam.us/".to_string(), 0);
        assert_eq!(g.country(), "us");
        assert_eq!(g.lookup_url("10001"), "https://api.zippopotam.us/us/10001");
        assert_eq!(g.lookup_url("SW1A 1AA"), "https://api.zippopotam.us/us/SW1A%201AA");
    }

    #[test]
    fn test_parse_string_coordinates() {
        let json = serde_json::json!({
            "post code": "10001",
            "places": [{"place name": "New York City", "latitude": "40.7484", "longitude": "-73.9967"}]
        });
        let coord = parse_first_place(&json).unwrap().unwrap();
        assert_eq!(coord, Coordinate::new(40.7484, -73.9967));
    }

    #[test]
    fn test_parse_numeric_coordinates_and_empty_places() {
        let json = serde_json::json!({"places": [{"latitude": 30.2672, "longitude": -97.7431}]});
        assert_eq!(parse_first_place(&json).unwrap(), Some(Coordinate::new(30.2672, -97.7431)));

        let json = serde_json::json!({"places": []});
        assert_eq!(parse_first_place(&json).unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let json = serde_json::json!({"places": [{"latitude": "north", "longitude": "-73.9"}]});
        assert!(matches!(parse_first_place(&json), Err(GeocodeError::InvalidResponse(_))));

        let json = serde_json::json!({"places": [{"latitude": "95.0", "longitude": "-73.9"}]});
        assert!(parse_first_place(&json).is_err());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GeocodeError::ApiError(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(GeocodeError::ApiError(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(!GeocodeError::ApiError(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!GeocodeError::InvalidResponse("x".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_geocode_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/us/10001")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"places":[{"latitude":"40.7484","longitude":"-73.9967"}]}"#)
            .create_async()
            .await;

        let g = geocoder(server.url(), 0);
        let coord = g.geocode("10001").await.unwrap();

        assert_eq!(coord, Some(Coordinate::new(40.7484, -73.9967)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_geocode_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/us/00000")
            .with_status(404)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let g = geocoder(server.url(), 3);
        assert_eq!(g.geocode("00000").await.unwrap(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_geocode_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/us/10001")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let g = geocoder(server.url(), 2);
        let result = g.geocode("10001").await;

        assert!(matches!(result, Err(GeocodeError::ApiError(StatusCode::SERVICE_UNAVAILABLE))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_blank_postal_code_skips_request() {
        let server = mockito::Server::new_async().await;
        let g = geocoder(server.url(), 0);
        assert_eq!(g.geocode("   ").await.unwrap(), None);
    }
}
