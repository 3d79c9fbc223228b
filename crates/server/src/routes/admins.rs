use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use common::types::StatusMessage;
use models::Record;
use serde::Deserialize;

use super::{payload::Payload, write_failure};
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct AdminSearchQuery {
    pub email: Option<String>,
}

pub async fn admin_entry(
    State(state): State<ServerState>,
    Payload(record): Payload,
) -> Result<Response, JsonApiError> {
    match state.gateway.add_admin(record).await {
        Ok(_) => Ok(Json(StatusMessage::inserted()).into_response()),
        Err(e) => write_failure(&state, "/adminEntry", e, StatusMessage::inserted()),
    }
}

/// Exact match on `adminEmail`; without `email` only records lacking the field match.
pub async fn admin_search(
    State(state): State<ServerState>,
    Query(q): Query<AdminSearchQuery>,
) -> Result<Json<Vec<Record>>, JsonApiError> {
    Ok(Json(state.gateway.search_admins(q.email).await?))
}
