//! Address to coordinate resolution.
//!
//! Restaurant writes resolve free-text addresses through a [`Geocoder`].
//! The production implementation talks to a Nominatim-compatible search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::Position;

/// User agent sent to the lookup service (Nominatim rejects anonymous clients).
const USER_AGENT: &str = concat!("RateMyBite/", env!("CARGO_PKG_VERSION"));

/// The lookup service could not answer.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed coordinates in response: {0}")]
    MalformedResponse(String),
}

/// Resolves a free-text address to a position.
///
/// `Ok(None)` means the service answered but found no match.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Position>, GeocodeError>;
}

/// Geocoder backed by a Nominatim search endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Position>, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let Some(place) = places.into_iter().next() else {
            tracing::debug!("No geocoding match for '{}'", address);
            return Ok(None);
        };

        let position = parse_place(&place)?;
        tracing::debug!("Resolved address '{}': {:?}", address, position);
        Ok(Some(position))
    }
}

fn parse_place(place: &NominatimPlace) -> Result<Position, GeocodeError> {
    let lat: f64 = place
        .lat
        .trim()
        .parse()
        .map_err(|_| GeocodeError::MalformedResponse(place.lat.clone()))?;
    let lng: f64 = place
        .lon
        .trim()
        .parse()
        .map_err(|_| GeocodeError::MalformedResponse(place.lon.clone()))?;
    Position::new(lat, lng).map_err(|_| GeocodeError::MalformedResponse(format!("{},{}", lat, lng)))
}

/// In-memory geocoder with a fixed address book.
#[cfg(test)]
pub struct FixedGeocoder {
    known: std::collections::HashMap<String, Position>,
    unavailable: bool,
}

#[cfg(test)]
impl FixedGeocoder {
    pub fn new(entries: &[(&str, f64, f64)]) -> Self {
        let known = entries
            .iter()
            .map(|(address, lat, lng)| (address.to_string(), Position { lat: *lat, lng: *lng }))
            .collect();
        Self {
            known,
            unavailable: false,
        }
    }

    /// A geocoder that fails every lookup as if the service were down.
    pub fn unavailable() -> Self {
        Self {
            known: Default::default(),
            unavailable: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Position>, GeocodeError> {
        if self.unavailable {
            return Err(GeocodeError::MalformedResponse("service down".to_string()));
        }
        Ok(self.known.get(address).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place() {
        let place = NominatimPlace {
            lat: "42.9956".to_string(),
            lon: " -71.4548".to_string(),
        };
        let position = parse_place(&place).unwrap();
        assert_eq!(position, Position { lat: 42.9956, lng: -71.4548 });
    }

    #[test]
    fn test_parse_place_rejects_garbage() {
        let place = NominatimPlace {
            lat: "north".to_string(),
            lon: "-71.4548".to_string(),
        };
        assert!(matches!(
            parse_place(&place),
            Err(GeocodeError::MalformedResponse(_))
        ));

        let out_of_range = NominatimPlace {
            lat: "123.0".to_string(),
            lon: "0".to_string(),
        };
        assert!(parse_place(&out_of_range).is_err());
    }

    #[tokio::test]
    async fn test_fixed_geocoder() {
        let geocoder = FixedGeocoder::new(&[("1 Ocean Ave", 42.995, -71.454)]);
        assert!(geocoder.geocode("1 Ocean Ave").await.unwrap().is_some());
        assert!(geocoder.geocode("nowhere").await.unwrap().is_none());
        assert!(FixedGeocoder::unavailable().geocode("x").await.is_err());
    }
}
