use std::sync::Arc;

use service::{identity::TokenVerifier, ResourceGateway, UploadRelay};

/// Shared handler state. Built once in `startup` around the injected store client.
#[derive(Clone)]
pub struct ServerState {
    pub gateway: Arc<ResourceGateway>,
    pub relay: Arc<UploadRelay>,
    pub verifier: Arc<dyn TokenVerifier>,
    /// Answer write routes with the success-shaped body even when the store fails.
    pub legacy_write_responses: bool,
    pub max_upload_bytes: usize,
}
