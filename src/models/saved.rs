//! Saved (favourite) listings, keyed by an opaque owner string.

use serde::Serialize;

use super::Listing;

/// Longest owner key accepted.
pub const MAX_OWNER_LEN: usize = 128;

/// A listing in an owner's saved set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedListing {
    pub saved_at: String,
    pub listing: Listing,
}
