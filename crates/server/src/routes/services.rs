use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::types::StatusMessage;
use models::Record;
use serde_json::Value;
use service::StagedUpload;
use tracing::{error, warn};

use super::write_failure;
use crate::errors::JsonApiError;
use crate::metrics;
use crate::state::ServerState;

/// Multipart field carrying the service banner image.
pub const BANNER_FIELD: &str = "serviceBanner";

fn multipart_rejection(e: MultipartError) -> JsonApiError {
    JsonApiError::new(e.status(), "Invalid Multipart Body", Some(e.body_text()))
}

fn staging_failure(e: impl std::fmt::Display) -> JsonApiError {
    metrics::UPLOAD_FAILURES_TOTAL.inc();
    error!(err = %e, "staging upload failed");
    JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Upload Staging Failed", Some(e.to_string()))
}

fn upload_failed() -> Response {
    metrics::UPLOAD_FAILURES_TOTAL.inc();
    (StatusCode::NOT_FOUND, "Upload Failed").into_response()
}

/// Stage the banner, relay it to the media host, then insert the service with its `photo` URL.
/// The staged file is removed when `banner` drops, on every path out of this handler.
pub async fn add_service(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<Response, JsonApiError> {
    let mut fields = Record::new();
    let mut banner: Option<StagedUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == BANNER_FIELD && banner.is_none() {
            let mut staged = state
                .relay
                .stage(BANNER_FIELD, field.file_name())
                .map_err(staging_failure)?;
            while let Some(chunk) = field.chunk().await.map_err(multipart_rejection)? {
                staged.write_chunk(&chunk).await.map_err(staging_failure)?;
            }
            staged.finish().await.map_err(staging_failure)?;
            // browsers send an empty file part when nothing was picked
            if !staged.is_empty() {
                banner = Some(staged);
            }
        } else if !name.is_empty() && name != BANNER_FIELD {
            let text = field.text().await.map_err(multipart_rejection)?;
            fields.insert(name, Value::String(text));
        }
    }

    let Some(banner) = banner else {
        warn!("addService without {BANNER_FIELD} file");
        return Err(JsonApiError::bad_request(
            "Missing File",
            format!("multipart field `{BANNER_FIELD}` is required"),
        ));
    };

    let photo_url = match state.relay.relay(&banner).await {
        Ok(url) => url,
        Err(_) => return Ok(upload_failed()),
    };
    drop(banner);

    match state.gateway.create_service(fields, photo_url).await {
        Ok(stored) => Ok(Json(stored).into_response()),
        Err(e) => write_failure(&state, "/addService", e, StatusMessage::corrupted()),
    }
}

pub async fn get_services(State(state): State<ServerState>) -> Result<Json<Vec<Record>>, JsonApiError> {
    Ok(Json(state.gateway.list_services().await?))
}
