//! Restaurant API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{merge_text, required_text, ApiResult, AppJson};
use crate::errors::AppError;
use crate::models::{
    non_blank, AddressUpdate, CreateRestaurantRequest, MessageResponse, Position, Restaurant,
    RestaurantFields, UpdateRestaurantRequest,
};
use crate::AppState;

/// GET /api/restaurants - List all restaurants.
pub async fn list_restaurants(State(state): State<AppState>) -> ApiResult<Json<Vec<Restaurant>>> {
    Ok(Json(state.repo.list_restaurants().await?))
}

/// GET /api/restaurants/:id - Get a single restaurant.
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Restaurant>> {
    state
        .repo
        .get_restaurant(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", id)))
}

/// POST /api/restaurants - Create a restaurant, geocoding its address.
pub async fn create_restaurant(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateRestaurantRequest>,
) -> ApiResult<(StatusCode, Json<Restaurant>)> {
    let name = required_text(&request.name, "name")?;
    let address = non_blank(request.address.as_deref());

    // Explicit coordinates win over a lookup.
    let position = match (request.position.resolve()?, &address) {
        (Some(position), _) => Some(position),
        (None, Some(address)) => Some(resolve_address(&state, address).await?),
        (None, None) => None,
    };

    let fields = RestaurantFields {
        name,
        address,
        cuisine: non_blank(request.cuisine.as_deref()),
        description: non_blank(request.description.as_deref()),
        image_url: non_blank(request.image_url.as_deref()),
        position,
    };

    let restaurant = state.repo.create_restaurant(&fields).await?;
    tracing::info!("Created restaurant {} ({})", restaurant.id, restaurant.name);
    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// PUT /api/restaurants/:id - Update a restaurant.
///
/// An empty address clears address and position; a new address is geocoded again.
pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateRestaurantRequest>,
) -> ApiResult<Json<Restaurant>> {
    let existing = state
        .repo
        .get_restaurant(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", id)))?;

    let name = match request.name.as_deref() {
        Some(name) => required_text(name, "name")?,
        None => existing.name.clone(),
    };

    let explicit = request.position.resolve()?;
    let (address, position) = match request.address_update() {
        AddressUpdate::Unchanged => (existing.address.clone(), explicit.or(existing.position())),
        AddressUpdate::Cleared => {
            if explicit.is_some() {
                return Err(AppError::validation(
                    "Coordinates cannot be set while clearing the address",
                ));
            }
            (None, None)
        }
        AddressUpdate::Replaced(address) => {
            let position = match explicit {
                Some(position) => position,
                None => resolve_address(&state, &address).await?,
            };
            (Some(address), Some(position))
        }
    };

    let fields = RestaurantFields {
        name,
        address,
        cuisine: merge_text(request.cuisine.as_deref(), &existing.cuisine),
        description: merge_text(request.description.as_deref(), &existing.description),
        image_url: merge_text(request.image_url.as_deref(), &existing.image_url),
        position,
    };

    let restaurant = state.repo.update_restaurant(&id, &fields).await?;
    Ok(Json(restaurant))
}

/// DELETE /api/restaurants/:id - Delete a restaurant.
pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.repo.delete_restaurant(&id).await?;
    tracing::info!("Deleted restaurant {}", id);
    Ok(Json(MessageResponse::new("Restaurant deleted")))
}

/// Geocode an address. No match is the caller's problem; an unreachable service is not.
async fn resolve_address(state: &AppState, address: &str) -> ApiResult<Position> {
    match state.geocoder.geocode(address).await? {
        Some(position) => Ok(position),
        None => {
            tracing::info!("Address could not be geocoded: '{}'", address);
            Err(AppError::Validation {
                message: "Failed to geocode address".to_string(),
                details: Some(serde_json::json!({ "address": address })),
            })
        }
    }
}
