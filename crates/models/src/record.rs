use serde_json::{Map, Value};

use crate::errors::ModelError;

/// A stored document as seen by handlers.
pub type Record = Map<String, Value>;

pub const ID: &str = "_id";
pub const PHOTO: &str = "photo";
pub const ADMIN_EMAIL: &str = "adminEmail";
pub const EMAIL: &str = "email";
pub const SERVICE_STATUS: &str = "serviceStatus";

/// Accept only JSON objects as record bodies.
pub fn record_from_value(value: Value) -> Result<Record, ModelError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::Validation(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
