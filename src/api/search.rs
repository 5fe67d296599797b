//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::models::Listing;
use crate::search::MAX_SEARCH_LIMIT;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// Number of matching documents, not just this page.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub listing: Listing,
    pub score: f32,
}

/// GET /api/search - Full-text search over listings.
pub async fn search_listings(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);
    let page = state.search.search(&params.q, limit, params.offset)?;

    // Hits whose listing vanished since indexing are skipped.
    let mut results = Vec::with_capacity(page.hits.len());
    for hit in page.hits {
        if let Some(listing) = state.repo.get_listing(hit.listing_id).await? {
            results.push(SearchResultItem {
                listing,
                score: hit.score,
            });
        }
    }

    success(SearchResponse {
        results,
        total: page.total,
        limit,
        offset: params.offset,
    })
}
