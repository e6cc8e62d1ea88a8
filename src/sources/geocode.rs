//! Geocoding capability and the Google Geocoding API client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
const SOURCE_NAME: &str = "geocoder";

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Geocoding status code, kept verbatim from the provider.
///
/// `EMPTY_ADDRESS` and `UNKNOWN_ERROR` are produced locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoStatus(String);

impl GeoStatus {
    pub const OK: &'static str = "OK";
    pub const ZERO_RESULTS: &'static str = "ZERO_RESULTS";
    pub const EMPTY_ADDRESS: &'static str = "EMPTY_ADDRESS";
    pub const UNKNOWN_ERROR: &'static str = "UNKNOWN_ERROR";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn ok() -> Self {
        Self::new(Self::OK)
    }

    pub fn zero_results() -> Self {
        Self::new(Self::ZERO_RESULTS)
    }

    pub fn empty_address() -> Self {
        Self::new(Self::EMPTY_ADDRESS)
    }

    pub fn unknown_error() -> Self {
        Self::new(Self::UNKNOWN_ERROR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_ok(&self) -> bool {
        self.0 == Self::OK
    }

    /// Plain-language reading of the code, for prompts.
    pub fn describe(&self) -> &'static str {
        match self.0.as_str() {
            Self::OK => "the address was located",
            Self::ZERO_RESULTS => "no matching location was found for this address",
            Self::EMPTY_ADDRESS => "the address was left blank",
            "INVALID_REQUEST" => "the address could not be interpreted",
            "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => {
                "the address lookup service was temporarily over capacity"
            }
            "REQUEST_DENIED" => "the address lookup service refused the request",
            _ => "the address lookup service could not be reached",
        }
    }
}

impl fmt::Display for GeoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for GeoStatus {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Provider answer for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResponse {
    pub status: GeoStatus,
    pub location: Option<Coordinates>,
}

/// Geocoding capability.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodeResponse, SourceError>;
}

/// Google Geocoding API client.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: SecretString) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(GEOCODE_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Request {
                source_name: SOURCE_NAME.into(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            api_key,
            endpoint: GEOCODE_URL.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: Coordinates,
}

impl From<GoogleResponse> for GeocodeResponse {
    fn from(response: GoogleResponse) -> Self {
        let status = GeoStatus::new(response.status);
        if !status.is_ok() {
            return GeocodeResponse {
                status,
                location: None,
            };
        }
        match response.results.into_iter().next() {
            Some(first) => GeocodeResponse {
                status,
                location: Some(first.geometry.location),
            },
            None => GeocodeResponse {
                status: GeoStatus::zero_results(),
                location: None,
            },
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodeResponse, SourceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(|e| SourceError::Request {
                source_name: SOURCE_NAME.into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: SOURCE_NAME.into(),
                status: status.as_u16(),
            });
        }

        let body: GoogleResponse = response.json().await.map_err(|e| SourceError::Malformed {
            source_name: SOURCE_NAME.into(),
            reason: e.to_string(),
        })?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> GeocodeResponse {
        serde_json::from_value::<GoogleResponse>(json).unwrap().into()
    }

    #[test]
    fn test_ok_response_takes_first_result() {
        let response = parse(serde_json::json!({
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 13.7563, "lng": 100.5018}}},
                {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
            ]
        }));
        assert!(response.status.is_ok());
        assert_eq!(
            response.location,
            Some(Coordinates {
                lat: 13.7563,
                lng: 100.5018
            })
        );
    }

    #[test]
    fn test_provider_status_passes_through_verbatim() {
        let response = parse(serde_json::json!({"status": "OVER_QUERY_LIMIT", "results": []}));
        assert_eq!(response.status, "OVER_QUERY_LIMIT");
        assert!(response.location.is_none());
    }

    #[test]
    fn test_ok_without_results_reads_as_zero_results() {
        let response = parse(serde_json::json!({"status": "OK", "results": []}));
        assert_eq!(response.status, GeoStatus::ZERO_RESULTS);
        assert!(response.location.is_none());
    }

    #[test]
    fn test_status_serializes_as_bare_string() {
        let json = serde_json::to_value(GeoStatus::empty_address()).unwrap();
        assert_eq!(json, serde_json::json!("EMPTY_ADDRESS"));
    }
}
