#![cfg(test)]
use configs::DatabaseConfig;
use mongodb::Database;

/// Connect to the test deployment named by `MONGODB_URI`, or `None` when it is unset.
pub async fn get_db() -> Result<Option<Database>, anyhow::Error> {
    let Ok(url) = std::env::var("MONGODB_URI") else { return Ok(None) };
    let cfg = DatabaseConfig { url, name: "creativeAgencyDB_test".into() };
    let db = models::db::connect(&cfg).await?;
    Ok(Some(db))
}
