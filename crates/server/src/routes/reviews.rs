use axum::{extract::State, response::{IntoResponse, Response}, Json};
use common::types::StatusMessage;
use models::Record;

use super::{payload::Payload, write_failure};
use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Newest reviews first, at most three.
pub async fn get_reviews(State(state): State<ServerState>) -> Result<Json<Vec<Record>>, JsonApiError> {
    Ok(Json(state.gateway.latest_reviews().await?))
}

pub async fn post_review(
    State(state): State<ServerState>,
    Payload(record): Payload,
) -> Result<Response, JsonApiError> {
    match state.gateway.post_review(record).await {
        Ok(stored) => Ok(Json(stored).into_response()),
        Err(e) => write_failure(&state, "/postReview", e, StatusMessage::inserted()),
    }
}
