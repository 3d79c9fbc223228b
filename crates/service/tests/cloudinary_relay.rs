use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use configs::MediaConfig;
use serde_json::json;
use service::{
    media::{CloudinaryHost, MediaError},
    UploadRelay,
};
use tokio::net::TcpListener;

type Seen = Arc<Mutex<HashMap<String, Vec<u8>>>>;

async fn fake_upload(State((seen, status)): State<(Seen, StatusCode)>, mut form: Multipart) -> (StatusCode, Json<serde_json::Value>) {
    while let Ok(Some(field)) = form.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        seen.lock().unwrap().insert(name, bytes);
    }
    if status.is_success() {
        (status, Json(json!({"secure_url": "https://res.cloudinary.test/agency/banner.png", "public_id": "banner"})))
    } else {
        (status, Json(json!({"error": {"message": "Invalid Signature"}})))
    }
}

async fn start_media_host(status: StatusCode) -> anyhow::Result<(String, Seen)> {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/v1_1/agency/image/upload", post(fake_upload))
        .with_state((seen.clone(), status));
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("media host error: {}", e); }
    });
    Ok((format!("http://{}", addr), seen))
}

fn media_config(base_url: String) -> MediaConfig {
    MediaConfig {
        cloud_name: "agency".into(),
        api_key: "key-123".into(),
        api_secret: "secret".into(),
        base_url,
        folder: Some("services".into()),
    }
}

#[tokio::test]
async fn relays_staged_file_and_returns_secure_url() -> anyhow::Result<()> {
    let (base, seen) = start_media_host(StatusCode::OK).await?;
    let dir = tempfile::tempdir()?;
    let relay = UploadRelay::new(Arc::new(CloudinaryHost::new(media_config(base))), dir.path());

    let mut staged = relay.stage("serviceBanner", Some("banner.png"))?;
    staged.write_chunk(b"banner-bytes").await?;
    staged.finish().await?;
    let url = relay.relay(&staged).await?;
    assert_eq!(url, "https://res.cloudinary.test/agency/banner.png");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.get("file").map(Vec::as_slice), Some(&b"banner-bytes"[..]));
    assert_eq!(seen.get("api_key").map(Vec::as_slice), Some(&b"key-123"[..]));
    assert_eq!(seen.get("folder").map(Vec::as_slice), Some(&b"services"[..]));
    assert_eq!(seen.get("signature").map(Vec::len), Some(64));
    assert!(seen.contains_key("timestamp"));
    Ok(())
}

#[tokio::test]
async fn rejected_upload_surfaces_status() -> anyhow::Result<()> {
    let (base, _) = start_media_host(StatusCode::UNAUTHORIZED).await?;
    let dir = tempfile::tempdir()?;
    let relay = UploadRelay::new(Arc::new(CloudinaryHost::new(media_config(base))), dir.path());

    let mut staged = relay.stage("serviceBanner", None)?;
    staged.write_chunk(b"x").await?;
    staged.finish().await?;
    let err = relay.relay(&staged).await.unwrap_err();
    assert!(matches!(err, MediaError::Rejected { status: 401, .. }), "{err}");
    Ok(())
}
