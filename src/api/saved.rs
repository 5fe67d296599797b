//! Saved listing endpoints. Owners are opaque client-chosen keys.

use axum::extract::{Path, State};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{SavedListing, MAX_OWNER_LEN};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub listing_id: i64,
    /// False when the listing was already saved.
    pub added: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub removed: u64,
}

fn check_owner(owner: &str) -> Result<&str, AppError> {
    let owner = owner.trim();
    if owner.is_empty() || owner.chars().count() > MAX_OWNER_LEN {
        return Err(AppError::BadRequest(format!(
            "Owner key must be 1 to {} characters",
            MAX_OWNER_LEN
        )));
    }
    Ok(owner)
}

/// GET /api/saved/{owner}
pub async fn list_saved(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> ApiResult<Vec<SavedListing>> {
    let owner = check_owner(&owner)?;
    success(state.repo.list_saved_listings(owner).await?)
}

/// PUT /api/saved/{owner}/{listing_id}
pub async fn save_listing(
    State(state): State<AppState>,
    Path((owner, listing_id)): Path<(String, i64)>,
) -> ApiResult<SaveOutcome> {
    let owner = check_owner(&owner)?;
    let added = state.repo.save_listing(owner, listing_id).await?;

    success(SaveOutcome { listing_id, added })
}

/// DELETE /api/saved/{owner}/{listing_id}
pub async fn unsave_listing(
    State(state): State<AppState>,
    Path((owner, listing_id)): Path<(String, i64)>,
) -> ApiResult<()> {
    let owner = check_owner(&owner)?;
    state.repo.unsave_listing(owner, listing_id).await?;

    success(())
}

/// DELETE /api/saved/{owner}
pub async fn clear_saved(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> ApiResult<ClearOutcome> {
    let owner = check_owner(&owner)?;
    let removed = state.repo.clear_saved(owner).await?;

    success(ClearOutcome { removed })
}
