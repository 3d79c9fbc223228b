pub mod admins;
pub mod auth;
pub mod orders;
pub mod payload;
pub mod registration;
pub mod reviews;
pub mod services;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};

use common::types::{Health, StatusMessage};
use service::errors::ServiceError;

use crate::errors::JsonApiError;
use crate::metrics;
use crate::state::ServerState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn greeting() -> &'static str {
    "Hello Creative Agency"
}

async fn metrics_endpoint() -> (axum::http::StatusCode, String) {
    metrics::encode_metrics()
}

/// Write-path failure: the fallback body in legacy mode, a real error otherwise.
pub(crate) fn write_failure(
    state: &ServerState,
    route: &'static str,
    err: ServiceError,
    fallback: StatusMessage,
) -> Result<Response, JsonApiError> {
    if state.legacy_write_responses {
        metrics::STORE_ERRORS_TOTAL.inc();
        error!(%route, err = %err, "write failed; answering with legacy body");
        return Ok(Json(fallback).into_response());
    }
    Err(err.into())
}

/// Build the full application router: public resource routes plus the token-guarded order listings.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/", get(greeting))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/addService",
            post(services::add_service).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/getServices", get(services::get_services))
        .route("/getReviews", get(reviews::get_reviews))
        .route("/postReview", post(reviews::post_review))
        .route("/registration", post(registration::register))
        .route("/adminEntry", post(admins::admin_entry))
        .route("/adminSearch", get(admins::admin_search))
        .route("/order", post(orders::create_order))
        .route("/updateStatus/:id", patch(orders::update_status));

    let guarded = Router::new()
        .route("/getOrders", get(orders::get_orders))
        .route("/getOrdersFor", get(orders::get_orders_for))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    public
        .merge(guarded)
        .route_layer(middleware::from_fn(metrics::track_http))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
