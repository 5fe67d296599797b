//! Contact message endpoints: public sending and the admin inbox.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::forms;
use crate::models::{Message, SendMessageRequest};
use crate::AppState;

/// POST /api/messages - Send a message about a listing.
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Message> {
    forms::into_result(forms::validate_contact(&request))?;

    let message = state.repo.create_message(&request).await?;
    tracing::info!(
        message_id = message.id,
        listing_id = message.listing_id,
        "Contact message received"
    );

    success(message)
}

/// GET /api/admin/messages - Inbox, newest first.
pub async fn list_messages(State(state): State<AppState>) -> ApiResult<Vec<Message>> {
    success(state.repo.list_messages().await?)
}

/// GET /api/admin/messages/{id}
pub async fn get_message(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    let message = state
        .repo
        .get_message(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {} not found", id)))?;

    success(message)
}

/// DELETE /api/admin/messages/{id}
pub async fn delete_message(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.repo.delete_message(id).await?;
    success(())
}
