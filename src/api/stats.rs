//! Marketplace statistics endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::catalog::MarketStats;
use crate::AppState;

/// GET /api/stats
pub async fn market_stats(State(state): State<AppState>) -> ApiResult<MarketStats> {
    let listings = state.repo.list_listings().await?;
    let brands = state.repo.list_brands().await?;

    success(MarketStats::compute(&listings, &brands))
}
