//! Contact messages sent to sellers about a listing. Append-only.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub listing_id: i64,
    pub sender_name: String,
    pub sender_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_phone: Option<String>,
    pub message: String,
    pub timestamp: String,
}

/// Contact form body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub listing_id: i64,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default)]
    pub sender_phone: Option<String>,
    #[serde(default)]
    pub message: String,
}
