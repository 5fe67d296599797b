//! Listing API endpoints: browsing, the posting wizard and admin edits.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::catalog::{self, Gallery, GalleryView, ListingFilters, SortOption};
use crate::errors::AppError;
use crate::forms::{self, ListingDraft, WizardStep, WIZARD_STEPS};
use crate::models::{Listing, UpdateListingRequest};
use crate::AppState;

/// Largest page the recent-listings endpoint serves.
const MAX_RECENT_LIMIT: usize = 100;

/// Separate from [`ListingFilters`] so an unknown sort key falls back instead of failing.
#[derive(Debug, Default, Deserialize)]
pub struct SortParam {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsResponse {
    pub listings: Vec<Listing>,
    pub total: usize,
    pub active_filters: usize,
    pub sort: SortOption,
}

/// GET /api/listings - Filter and sort listings.
pub async fn list_listings(
    State(state): State<AppState>,
    Query(filters): Query<ListingFilters>,
    Query(param): Query<SortParam>,
) -> ApiResult<ListingsResponse> {
    let sort = param
        .sort
        .as_deref()
        .map(SortOption::parse)
        .unwrap_or_default();

    let listings = catalog::apply(state.repo.list_listings().await?, &filters, sort);

    success(ListingsResponse {
        total: listings.len(),
        listings,
        active_filters: filters.active_count(),
        sort,
    })
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /api/listings/recent - Most recently posted listings.
pub async fn recent_listings(
    State(state): State<AppState>,
    Query(params): Query<RecentQuery>,
) -> ApiResult<Vec<Listing>> {
    let limit = params
        .limit
        .unwrap_or(state.config.recent_limit)
        .min(MAX_RECENT_LIMIT);

    success(catalog::recent(state.repo.list_listings().await?, limit))
}

/// GET /api/listings/featured - Featured listings, newest first.
pub async fn featured_listings(State(state): State<AppState>) -> ApiResult<Vec<Listing>> {
    let mut featured: Vec<Listing> = state
        .repo
        .list_listings()
        .await?
        .into_iter()
        .filter(|l| l.featured)
        .collect();
    catalog::sort_listings(&mut featured, SortOption::Recent);

    success(featured)
}

/// GET /api/listings/{id} - Get a single listing.
pub async fn get_listing(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Listing> {
    success(find_listing(&state, id).await?)
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    #[serde(default)]
    pub index: i64,
}

/// GET /api/listings/{id}/gallery - Image cursor for a listing.
pub async fn listing_gallery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<GalleryQuery>,
) -> ApiResult<GalleryView> {
    let listing = find_listing(&state, id).await?;
    success(Gallery::at(&listing.images, params.index).view())
}

/// POST /api/listings - Publish a listing from a completed wizard draft.
pub async fn create_listing(
    State(state): State<AppState>,
    Json(draft): Json<ListingDraft>,
) -> ApiResult<Listing> {
    let new_listing = draft.into_new_listing()?;
    let listing = state.repo.create_listing(&new_listing).await?;

    tracing::info!(listing_id = listing.id, "Listing published");
    reindex_listing(&state, &listing).await;

    success(listing)
}

/// GET /api/listings/wizard - The wizard steps.
pub async fn wizard_steps() -> ApiResult<Vec<WizardStep>> {
    success(WIZARD_STEPS.to_vec())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub step: u8,
    pub valid: bool,
    pub errors: crate::errors::FieldErrors,
}

/// POST /api/listings/wizard/{step} - Check one step of a draft.
pub async fn validate_wizard_step(
    Path(step): Path<u8>,
    Json(draft): Json<ListingDraft>,
) -> ApiResult<StepValidation> {
    let errors = draft.validate_step(step)?;

    success(StepValidation {
        step,
        valid: errors.is_empty(),
        errors,
    })
}

/// PUT /api/admin/listings/{id} - Update a listing.
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateListingRequest>,
) -> ApiResult<Listing> {
    forms::into_result(forms::validate_listing_update(&request))?;

    let listing = state.repo.update_listing(id, &request).await?;
    reindex_listing(&state, &listing).await;

    success(listing)
}

/// DELETE /api/admin/listings/{id} - Delete a listing.
pub async fn delete_listing(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.repo.delete_listing(id).await?;

    tracing::info!(listing_id = id, "Listing deleted");
    if let Err(e) = state.search.remove_listing(id).await {
        tracing::warn!("Failed to remove listing {} from search index: {}", id, e);
    }

    success(())
}

async fn find_listing(state: &AppState, id: i64) -> Result<Listing, AppError> {
    state
        .repo
        .get_listing(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))
}

/// The store is authoritative; a stale index only degrades search.
async fn reindex_listing(state: &AppState, listing: &Listing) {
    if let Err(e) = state.search.index_listing(listing).await {
        tracing::warn!("Failed to index listing {}: {}", listing.id, e);
    }
}
