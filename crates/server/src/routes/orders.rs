use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use common::types::StatusMessage;
use models::Record;
use serde::Deserialize;
use serde_json::Value;
use service::identity::VerifiedClaims;
use tracing::debug;

use super::{payload::Payload, write_failure};
use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct OrdersForQuery {
    pub user: Option<String>,
}

pub async fn create_order(
    State(state): State<ServerState>,
    Payload(record): Payload,
) -> Result<Response, JsonApiError> {
    match state.gateway.create_order(record).await {
        Ok(stored) => Ok(Json(stored).into_response()),
        Err(e) => write_failure(&state, "/order", e, StatusMessage::inserted()),
    }
}

pub async fn get_orders(
    State(state): State<ServerState>,
    Extension(claims): Extension<VerifiedClaims>,
) -> Result<Json<Vec<Record>>, JsonApiError> {
    debug!(subject = %claims.sub, "listing all orders");
    Ok(Json(state.gateway.list_orders().await?))
}

pub async fn get_orders_for(
    State(state): State<ServerState>,
    Extension(claims): Extension<VerifiedClaims>,
    Query(q): Query<OrdersForQuery>,
) -> Result<Json<Vec<Record>>, JsonApiError> {
    debug!(subject = %claims.sub, user = ?q.user, "listing orders for user");
    Ok(Json(state.gateway.list_orders_for(q.user).await?))
}

/// `true` only when the order's `serviceStatus` actually changed.
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Payload(mut body): Payload,
) -> Result<Json<bool>, JsonApiError> {
    let status = body.remove("status").unwrap_or(Value::Null);
    Ok(Json(state.gateway.update_order_status(&id, status).await?))
}
