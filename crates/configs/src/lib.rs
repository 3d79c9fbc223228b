use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Staging directory for uploaded files before they are relayed.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Answer write routes with the success-shaped body even when the store fails.
    #[serde(default)]
    pub legacy_write_responses: bool,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: None,
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            legacy_write_responses: false,
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_db_name")]
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: String::new(), name: default_db_name() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_media_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub folder: Option<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            base_url: default_media_base_url(),
            folder: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
    #[serde(default = "default_jwks_ttl")]
    pub jwks_ttl_secs: u64,
    /// Floor between two key-set fetches, however many unknown `kid`s arrive.
    #[serde(default = "default_jwks_min_refresh")]
    pub jwks_min_refresh_secs: u64,
    /// How long past the TTL a cached key set is still used when a refresh fails.
    #[serde(default = "default_jwks_max_stale")]
    pub jwks_max_stale_secs: u64,
    /// When set, tokens are verified as HS256 with this secret instead of the JWK set.
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            jwks_url: default_jwks_url(),
            jwks_ttl_secs: default_jwks_ttl(),
            jwks_min_refresh_secs: default_jwks_min_refresh(),
            jwks_max_stale_secs: default_jwks_max_stale(),
            jwt_secret: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 5000 }
fn default_upload_dir() -> String { "uploads".into() }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }
fn default_db_name() -> String { "creativeAgencyDB".into() }
fn default_media_base_url() -> String { "https://api.cloudinary.com".into() }
fn default_jwks_url() -> String { DEFAULT_JWKS_URL.into() }
fn default_jwks_ttl() -> u64 { 3600 }
fn default_jwks_min_refresh() -> u64 { 60 }
fn default_jwks_max_stale() -> u64 { 300 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file when present, defaults otherwise; environment always wins.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok());
        self.server.normalize()?;
        self.database.validate()?;
        self.identity.validate()?;
        Ok(())
    }

    /// Overlay environment values using `lookup`, so tests can supply their own source.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(flag) = lookup("LEGACY_WRITE_RESPONSES") {
            self.server.legacy_write_responses = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        if let Some(name) = lookup("DB_NAME") {
            self.database.name = name;
        }
        if let Some(url) = lookup("MONGODB_URI") {
            self.database.url = url;
        } else if self.database.url.trim().is_empty() {
            if let (Some(user), Some(pass), Some(host)) = (lookup("DB_USER"), lookup("DB_PASS"), lookup("DB_HOST")) {
                self.database.url = format!(
                    "mongodb+srv://{}:{}@{}/{}?retryWrites=true&w=majority",
                    user, pass, host, self.database.name
                );
            }
        }

        if let Some(v) = lookup("CLOUD_NAME") { self.media.cloud_name = v; }
        if let Some(v) = lookup("API_KEY") { self.media.api_key = v; }
        if let Some(v) = lookup("API_SECRET") { self.media.api_secret = v; }

        if let Some(v) = lookup("FIREBASE_PROJECT_ID") { self.identity.project_id = v; }
        if let Some(v) = lookup("JWT_SECRET") { self.identity.jwt_secret = Some(v); }
        self.identity.normalize();
    }
}

impl MediaConfig {
    pub fn is_configured(&self) -> bool {
        !(self.cloud_name.trim().is_empty() || self.api_key.trim().is_empty() || self.api_secret.trim().is_empty())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        if self.upload_dir.trim().is_empty() {
            self.upload_dir = default_upload_dir();
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("server.max_upload_bytes must be positive"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or MONGODB_URI"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("mongodb://") || lower.starts_with("mongodb+srv://")) {
            return Err(anyhow!("database.url must start with mongodb:// or mongodb+srv://"));
        }
        if self.name.trim().is_empty() {
            return Err(anyhow!("database.name is empty"));
        }
        Ok(())
    }
}

impl IdentityConfig {
    /// The HS256 secret, if a non-blank one is set. A blank secret counts as unset.
    pub fn shared_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn normalize(&mut self) {
        if self.shared_secret().is_none() {
            self.jwt_secret = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let has_secret = self.shared_secret().is_some();
        if !has_secret && self.project_id.trim().is_empty() {
            return Err(anyhow!("identity needs either project_id (FIREBASE_PROJECT_ID) or jwt_secret (JWT_SECRET)"));
        }
        if !has_secret && self.jwks_url.trim().is_empty() {
            return Err(anyhow!("identity.jwks_url is empty"));
        }
        Ok(())
    }
}
