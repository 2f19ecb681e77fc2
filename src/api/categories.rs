//! Category API endpoints (admin only).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{merge_text, required_text, ApiResult, AppJson};
use crate::errors::AppError;
use crate::models::{
    non_blank, Category, CreateCategoryRequest, MessageResponse, UpdateCategoryRequest,
};
use crate::AppState;

/// GET /api/admin/categories - List all categories.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories().await?))
}

/// GET /api/admin/categories/:id - Get a single category.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    state
        .repo
        .get_category(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
}

/// POST /api/admin/categories - Create a category with a unique name.
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let name = required_text(&request.name, "name")?;

    // The unique index still catches a concurrent insert between check and write.
    if state.repo.get_category_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict("Category already exists".to_string()));
    }

    let description = non_blank(request.description.as_deref());
    let category = state
        .repo
        .create_category(&name, description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/admin/categories/:id - Rename or describe a category.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    let existing = state
        .repo
        .get_category(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

    let name = match request.name.as_deref() {
        Some(name) => required_text(name, "name")?,
        None => existing.name.clone(),
    };

    if name != existing.name {
        if let Some(other) = state.repo.get_category_by_name(&name).await? {
            if other.id != existing.id {
                return Err(AppError::Conflict("Category already exists".to_string()));
            }
        }
    }

    let description = merge_text(request.description.as_deref(), &existing.description);
    let category = state
        .repo
        .update_category(&id, &name, description.as_deref())
        .await?;
    Ok(Json(category))
}

/// DELETE /api/admin/categories/:id - Delete a category.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.repo.delete_category(&id).await?;
    Ok(Json(MessageResponse::new("Category deleted")))
}
