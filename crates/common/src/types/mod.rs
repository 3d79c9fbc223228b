use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// `{status, message}` body returned by write routes that do not echo the record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn inserted() -> Self {
        Self {
            status: "success".into(),
            message: r#"<p className="text-success">Data inserted!</p>"#.into(),
        }
    }

    pub fn corrupted() -> Self {
        Self {
            status: "error".into(),
            message: r#"<p className="text-danger">Data corrupted</p>"#.into(),
        }
    }
}

/// Fixed body for every rejected bearer token.
#[derive(Serialize, Deserialize, Debug)]
pub struct Unauthorized {
    pub status: &'static str,
}

impl Default for Unauthorized {
    fn default() -> Self {
        Self { status: "Unauthorized" }
    }
}
