//! Restaurant model and the geometry adapter for its position.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Canonical geographic position of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    /// Build a position, rejecting out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, AppError> {
        if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
            return Err(AppError::Validation {
                message: "Coordinates out of range".to_string(),
                details: Some(serde_json::json!({ "lat": lat, "lng": lng })),
            });
        }
        Ok(Self { lat, lng })
    }

    /// Read a GeoJSON point (`coordinates` are `[longitude, latitude]`).
    pub fn from_geojson(point: &GeoJsonPoint) -> Result<Self, AppError> {
        if point.kind != "Point" {
            return Err(AppError::validation(format!(
                "Unsupported location type '{}', expected 'Point'",
                point.kind
            )));
        }
        match point.coordinates.as_slice() {
            [lng, lat] => Self::new(*lat, *lng),
            _ => Err(AppError::validation(
                "Location coordinates must be [longitude, latitude]",
            )),
        }
    }
}

/// GeoJSON point as sent by older clients.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type", default = "point_kind")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

fn point_kind() -> String {
    "Point".to_string()
}

/// Optional explicit position in a request body, flat or GeoJSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionInput {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub location: Option<GeoJsonPoint>,
}

impl PositionInput {
    /// Normalize whichever shape was supplied into a [`Position`].
    pub fn resolve(&self) -> Result<Option<Position>, AppError> {
        match (self.lat, self.lng, &self.location) {
            (Some(lat), Some(lng), _) => Position::new(lat, lng).map(Some),
            (None, None, Some(point)) => Position::from_geojson(point).map(Some),
            (None, None, None) => Ok(None),
            _ => Err(AppError::validation(
                "Both lat and lng are required when either is given",
            )),
        }
    }
}

/// A restaurant listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub cuisine: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub avg_rating: f64,
    pub review_count: i64,
    pub is_claimed: bool,
    pub owner_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Restaurant {
    pub fn position(&self) -> Option<Position> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Position { lat, lng }),
            _ => None,
        }
    }
}

/// Request body for creating a restaurant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "category")]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub position: PositionInput,
}

/// Request body for updating a restaurant. Absent fields stay untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "category")]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub position: PositionInput,
}

/// What an update does to the address and, through it, to the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressUpdate {
    Unchanged,
    Cleared,
    Replaced(String),
}

impl UpdateRestaurantRequest {
    pub fn address_update(&self) -> AddressUpdate {
        match self.address.as_deref().map(str::trim) {
            None => AddressUpdate::Unchanged,
            Some("") => AddressUpdate::Cleared,
            Some(address) => AddressUpdate::Replaced(address.to_string()),
        }
    }
}

/// Fully resolved values written to the store.
#[derive(Debug, Clone)]
pub struct RestaurantFields {
    pub name: String,
    pub address: Option<String>,
    pub cuisine: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub position: Option<Position>,
}

/// Trim a free-text field, turning blank input into `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(body: serde_json::Value) -> UpdateRestaurantRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_address_update_semantics() {
        assert_eq!(
            update(serde_json::json!({ "name": "x" })).address_update(),
            AddressUpdate::Unchanged
        );
        assert_eq!(
            update(serde_json::json!({ "address": "" })).address_update(),
            AddressUpdate::Cleared
        );
        assert_eq!(
            update(serde_json::json!({ "address": "   " })).address_update(),
            AddressUpdate::Cleared
        );
        assert_eq!(
            update(serde_json::json!({ "address": " 50 Elm St " })).address_update(),
            AddressUpdate::Replaced("50 Elm St".to_string())
        );
    }

    #[test]
    fn test_geojson_is_longitude_first() {
        let input: PositionInput = serde_json::from_value(serde_json::json!({
            "location": { "type": "Point", "coordinates": [-71.454, 42.995] }
        }))
        .unwrap();
        assert_eq!(
            input.resolve().unwrap(),
            Some(Position { lat: 42.995, lng: -71.454 })
        );
    }

    #[test]
    fn test_flat_position_and_half_pairs() {
        let input: PositionInput =
            serde_json::from_value(serde_json::json!({ "lat": 42.995, "lng": -71.454 })).unwrap();
        assert!(input.resolve().unwrap().is_some());

        let half: PositionInput = serde_json::from_value(serde_json::json!({ "lat": 42.995 })).unwrap();
        assert!(half.resolve().is_err());

        assert_eq!(PositionInput::default().resolve().unwrap(), None);
    }

    #[test]
    fn test_position_range_checks() {
        assert!(Position::new(90.0, 180.0).is_ok());
        assert!(Position::new(90.5, 0.0).is_err());
        assert!(Position::new(0.0, -181.0).is_err());
        assert!(Position::new(f64::NAN, 0.0).is_err());

        let bad = GeoJsonPoint {
            kind: "LineString".to_string(),
            coordinates: vec![0.0, 0.0],
        };
        assert!(Position::from_geojson(&bad).is_err());

        let short = GeoJsonPoint {
            kind: "Point".to_string(),
            coordinates: vec![1.0],
        };
        assert!(Position::from_geojson(&short).is_err());
    }

    #[test]
    fn test_category_alias_for_cuisine() {
        let request: CreateRestaurantRequest = serde_json::from_value(serde_json::json!({
            "name": "Burger Barn",
            "category": "American"
        }))
        .unwrap();
        assert_eq!(request.cuisine.as_deref(), Some("American"));
        assert!(request.address.is_none());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" Thai ")), Some("Thai".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
