use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, IdentityConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::{
    identity::{FirebaseVerifier, SharedSecretVerifier, TokenVerifier},
    media::{CloudinaryHost, MediaHost},
    store::{mongo::MongoStore, DocumentStore},
    ResourceGateway, UploadRelay,
};

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

pub fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// HS256 with the shared secret when a non-blank one is configured, Firebase ID tokens otherwise.
pub fn build_verifier(cfg: &IdentityConfig) -> Arc<dyn TokenVerifier> {
    match cfg.shared_secret() {
        Some(secret) => {
            info!("verifying bearer tokens with shared secret (HS256)");
            Arc::new(SharedSecretVerifier::new(secret))
        }
        None => {
            info!(project = %cfg.project_id, "verifying bearer tokens as Firebase ID tokens");
            Arc::new(FirebaseVerifier::new(cfg))
        }
    }
}

pub fn build_state(
    cfg: &AppConfig,
    store: Arc<dyn DocumentStore>,
    media: Arc<dyn MediaHost>,
    verifier: Arc<dyn TokenVerifier>,
) -> ServerState {
    ServerState {
        gateway: Arc::new(ResourceGateway::new(store)),
        relay: Arc::new(UploadRelay::new(media, &cfg.server.upload_dir)),
        verifier,
        legacy_write_responses: cfg.server.legacy_write_responses,
        max_upload_bytes: cfg.server.max_upload_bytes,
    }
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(err = %e, "cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Connect the store, build the app and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    common::env::ensure_upload_dir(&cfg.server.upload_dir).await?;

    let db = models::db::connect(&cfg.database)
        .await
        .map_err(|e| StartupError::Store(e.to_string()))?;
    info!(database = %cfg.database.name, "document store connected");
    let store: Arc<dyn DocumentStore> = Arc::new(MongoStore::new(db));

    if !cfg.media.is_configured() {
        warn!("media host credentials missing; /addService uploads will fail");
    }
    let media: Arc<dyn MediaHost> = Arc::new(CloudinaryHost::new(cfg.media.clone()));
    let verifier = build_verifier(&cfg.identity);

    let state = build_state(&cfg, store, media, verifier);
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, "agency api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)?;
    info!(event = "stop", "server stopped");
    Ok(())
}
