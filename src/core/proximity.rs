use futures::stream::{self, StreamExt};
use std::time::Duration;
use thiserror::Error;

use crate::core::distance::is_within_radius;
use crate::models::{Coordinate, Listing};
use crate::services::Geocoder;

/// Errors that abort the proximity stage
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProximityError {
    #[error("Reference postal code '{0}' could not be geocoded")]
    InvalidReference(String),
}

/// Post-filter keeping listings within a radius of a reference postal code
///
/// The reference is geocoded first; if that fails the whole stage fails.
/// Each candidate is then geocoded (up to `concurrency` lookups in flight,
/// results consumed in input order) and kept iff its distance to the
/// reference is <= the radius. Candidates whose postal code cannot be
/// resolved are dropped.
#[derive(Debug, Clone)]
pub struct ProximityFilter {
    concurrency: usize,
    lookup_timeout: Duration,
}

impl ProximityFilter {
    pub fn new(concurrency: usize, lookup_timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            lookup_timeout,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Geocode with the per-call timeout; every failure mode collapses to `None`
    async fn lookup<G: Geocoder>(&self, geocoder: &G, postal_code: &str) -> Option<Coordinate> {
        match tokio::time::timeout(self.lookup_timeout, geocoder.geocode(postal_code)).await {
            Ok(Ok(Some(coordinate))) => Some(coordinate),
            Ok(Ok(None)) => {
                tracing::debug!("Postal code {} not found by geocoder", postal_code);
                None
            }
            Ok(Err(e)) => {
                tracing::debug!("Geocoding {} failed: {}", postal_code, e);
                None
            }
            Err(_) => {
                tracing::debug!(
                    "Geocoding {} timed out after {:?}",
                    postal_code,
                    self.lookup_timeout
                );
                None
            }
        }
    }

    /// Geocode the reference postal code; a timeout counts as unresolved
    pub async fn resolve_reference<G: Geocoder>(
        &self,
        geocoder: &G,
        reference_zip: &str,
    ) -> Result<Coordinate, ProximityError> {
        match self.lookup(geocoder, reference_zip).await {
            Some(coordinate) => Ok(coordinate),
            None => {
                tracing::info!("Rejecting proximity search: reference ZIP {} unresolved", reference_zip);
                Err(ProximityError::InvalidReference(reference_zip.to_string()))
            }
        }
    }

    /// Keep the candidates within `radius_miles` of an already resolved reference
    pub async fn filter_candidates<G: Geocoder>(
        &self,
        geocoder: &G,
        reference: Coordinate,
        radius_miles: u32,
        candidates: Vec<Listing>,
    ) -> Vec<Listing> {
        let radius = f64::from(radius_miles);
        let total = candidates.len();

        let kept: Vec<Listing> = stream::iter(candidates)
            .map(move |listing| async move {
                let coordinate = self.lookup(geocoder, &listing.zip_code).await;
                (listing, coordinate)
            })
            .buffered(self.concurrency)
            .filter_map(move |(listing, coordinate)| async move {
                match coordinate {
                    Some(c) if is_within_radius(reference, c, radius) => Some(listing),
                    _ => None,
                }
            })
            .collect()
            .await;

        tracing::debug!(
            "Proximity filter kept {}/{} listings within {} miles",
            kept.len(),
            total,
            radius_miles
        );

        kept
    }
}
