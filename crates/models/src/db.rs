use configs::DatabaseConfig;
use mongodb::{bson::doc, Client, Database};
use tracing::info;

/// Open the process-wide client and check the deployment answers a ping.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Database> {
    let client = Client::with_uri_str(&cfg.url).await?;
    let db = client.database(&cfg.name);
    db.run_command(doc! { "ping": 1 }, None).await?;
    info!(database = %cfg.name, "connected to document store");
    Ok(db)
}
