use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use common::types::Unauthorized;
use tracing::{debug, warn};

use crate::metrics;
use crate::state::ServerState;

const BEARER_PREFIX: &str = "Bearer ";

/// Token from `Authorization: Bearer <token>`; `None` when the header is absent or uses another scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let rest = raw.strip_prefix(BEARER_PREFIX)?;
    Some(rest.split(' ').next().unwrap_or_default())
}

fn unauthorized() -> Response {
    metrics::AUTH_REJECTIONS_TOTAL.inc();
    (StatusCode::UNAUTHORIZED, Json(Unauthorized::default())).into_response()
}

/// Route layer for guarded routes. Every failure cause collapses into the same 401;
/// the verified claims are handed to the handler as a request extension.
pub async fn require_bearer_token(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        warn!(%path, "missing or malformed Authorization header (expect Bearer)");
        return unauthorized();
    };

    match state.verifier.verify(&token).await {
        Ok(claims) => {
            debug!(%path, subject = %claims.sub, "token verified");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            warn!(%path, err = %e, "token verification failed");
            unauthorized()
        }
    }
}
