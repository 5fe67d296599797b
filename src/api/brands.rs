//! Brand API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{success, ApiResult};
use crate::catalog::BrandQuery;
use crate::errors::AppError;
use crate::forms;
use crate::models::{Brand, BrandForm, UpdateBrandRequest};
use crate::AppState;

/// GET /api/brands - Filtered and ordered brand list.
pub async fn list_brands(
    State(state): State<AppState>,
    Query(query): Query<BrandQuery>,
) -> ApiResult<Vec<Brand>> {
    success(query.apply(state.repo.list_brands().await?))
}

/// GET /api/brands/{id} - Get a single brand.
pub async fn get_brand(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Brand> {
    let brand = state
        .repo
        .get_brand(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Brand {} not found", id)))?;

    success(brand)
}

/// POST /api/admin/brands - Create a brand.
pub async fn create_brand(
    State(state): State<AppState>,
    Json(form): Json<BrandForm>,
) -> ApiResult<Brand> {
    forms::into_result(forms::validate_brand(&form))?;

    let brand = state.repo.create_brand(&form).await?;
    tracing::info!(brand_id = brand.id, name = %brand.name, "Brand created");

    success(brand)
}

/// PUT /api/admin/brands/{id} - Update a brand.
pub async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBrandRequest>,
) -> ApiResult<Brand> {
    forms::into_result(forms::validate_brand_update(&request))?;

    success(state.repo.update_brand(id, &request).await?)
}

/// DELETE /api/admin/brands/{id} - Delete a brand.
pub async fn delete_brand(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.repo.delete_brand(id).await?;
    tracing::info!(brand_id = id, "Brand deleted");

    success(())
}
