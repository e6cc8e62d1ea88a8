//! Address geocoding and home/work distance checks.

use std::sync::Arc;

use geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Serialize};

use crate::sources::{Coordinates, GeoStatus, Geocoder};

/// Default home/work distance limit.
pub const DEFAULT_DISTANCE_LIMIT_KM: f64 = 150.0;

/// Outcome of geocoding one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub coordinates: Option<Coordinates>,
    pub status: GeoStatus,
}

/// Resolves free-text addresses, turning every failure into a status code.
pub struct GeoLookup {
    geocoder: Arc<dyn Geocoder>,
}

impl GeoLookup {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    pub async fn geocode_address(&self, address: &str) -> GeocodeResult {
        let address = address.trim();
        if address.is_empty() {
            return GeocodeResult {
                coordinates: None,
                status: GeoStatus::empty_address(),
            };
        }

        match self.geocoder.geocode(address).await {
            Ok(response) => {
                if !response.status.is_ok() {
                    tracing::warn!(address, status = %response.status, "Geocoding did not resolve");
                }
                GeocodeResult {
                    coordinates: response.location,
                    status: response.status,
                }
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "Geocoding request failed");
                GeocodeResult {
                    coordinates: None,
                    status: GeoStatus::unknown_error(),
                }
            }
        }
    }
}

/// Result of comparing two addresses against a distance limit.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceCheck {
    pub within_limit: bool,
    pub distance_km: Option<f64>,
    pub origin: GeocodeResult,
    pub destination: GeocodeResult,
}

impl DistanceCheck {
    pub fn status_a(&self) -> &GeoStatus {
        &self.origin.status
    }

    pub fn status_b(&self) -> &GeoStatus {
        &self.destination.status
    }
}

/// Geodesic distance between two geocoded addresses.
pub struct DistanceChecker {
    lookup: GeoLookup,
}

impl DistanceChecker {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            lookup: GeoLookup::new(geocoder),
        }
    }

    /// Fails closed: if either address does not resolve the result is
    /// `within_limit = false` with no distance, carrying both status codes.
    pub async fn check_distance_within_limit(
        &self,
        address_a: &str,
        address_b: &str,
        limit_km: f64,
    ) -> DistanceCheck {
        let (origin, destination) = tokio::join!(
            self.lookup.geocode_address(address_a),
            self.lookup.geocode_address(address_b)
        );

        let distance_km = match (origin.coordinates, destination.coordinates) {
            (Some(a), Some(b)) => Some(geodesic_km(a, b)),
            _ => None,
        };

        DistanceCheck {
            within_limit: distance_km.is_some_and(|d| d <= limit_km),
            distance_km,
            origin,
            destination,
        }
    }
}

/// Distance on the WGS-84 ellipsoid in kilometres (Karney's geodesic).
pub fn geodesic_km(a: Coordinates, b: Coordinates) -> f64 {
    Geodesic.distance(Point::new(a.lng, a.lat), Point::new(b.lng, b.lat)) / 1000.0
}
