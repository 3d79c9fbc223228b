use axum::{extract::State, response::{IntoResponse, Response}, Json};
use common::types::StatusMessage;

use super::{payload::Payload, write_failure};
use crate::errors::JsonApiError;
use crate::state::ServerState;

pub async fn register(
    State(state): State<ServerState>,
    Payload(record): Payload,
) -> Result<Response, JsonApiError> {
    match state.gateway.submit_registration(record).await {
        Ok(_) => Ok(Json(StatusMessage::inserted()).into_response()),
        Err(e) => write_failure(&state, "/registration", e, StatusMessage::inserted()),
    }
}
