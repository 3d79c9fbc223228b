use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use models::{record::record_from_value, Record};
use serde_json::Value;

use crate::errors::JsonApiError;

/// Record body accepted as JSON object or as a URL-encoded form.
/// A request without `Content-Type` carries no fields and yields an empty record.
pub struct Payload(pub Record);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = JsonApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(CONTENT_TYPE) {
            return Ok(Payload(Record::new()));
        }
        if is_form(&req) {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| JsonApiError::new(e.status(), "Invalid Body", Some(e.body_text())))?;
            return Ok(Payload(fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect()));
        }
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| JsonApiError::new(e.status(), "Invalid Body", Some(e.body_text())))?;
        record_from_value(value)
            .map(Payload)
            .map_err(|e| JsonApiError::bad_request("Invalid Body", e.to_string()))
    }
}
