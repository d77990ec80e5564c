//! Configuration loading for Murmur.
//! Reads murmur.toml from the current directory or the path in the
//! MURMUR_CONFIG env var, then applies environment overrides so credentials
//! never have to live in the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bearer credential for the bot API. Prefer MURMUR_API_KEY over the file.
    pub api_key: Option<String>,
    /// Meeting to ingest. Required in live mode.
    pub meeting_id: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_mode")]
    pub mode: SourceMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Live,
    Mock,
}

fn default_base_url() -> String {
    murmur_ingestion::sources::remote::DEFAULT_BASE_URL.to_string()
}
fn default_mode() -> SourceMode {
    SourceMode::Live
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            meeting_id: None,
            base_url: default_base_url(),
            mode: default_mode(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_host")]
    pub host: String,
    /// Qdrant gRPC port.
    #[serde(default = "default_store_port")]
    pub port: u16,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

fn default_store_host() -> String {
    "localhost".to_string()
}
fn default_store_port() -> u16 {
    6334
}
fn default_collection() -> String {
    murmur_store::qdrant::DEFAULT_COLLECTION.to_string()
}
fn default_embedding_dim() -> usize {
    murmur_store::embedding::DEFAULT_EMBEDDING_DIM
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_store_host(),
            port: default_store_port(),
            collection: default_collection(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,
}

fn default_poll_interval() -> f64 {
    2.0
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

mod tests;

impl Config {
    /// Load configuration from murmur.toml.
    /// Checks MURMUR_CONFIG first, then the current directory; a missing
    /// file yields defaults so a pure-env setup works too.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("MURMUR_CONFIG").unwrap_or_else(|_| "murmur.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("MURMUR_API_KEY") {
            self.api.api_key = Some(key);
        }
        if let Ok(meeting) = std::env::var("MURMUR_MEETING_ID") {
            self.api.meeting_id = Some(meeting);
        }
        if let Ok(url) = std::env::var("MURMUR_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(mode) = std::env::var("MURMUR_MODE") {
            match mode.to_lowercase().as_str() {
                "mock" => self.api.mode = SourceMode::Mock,
                "live" => self.api.mode = SourceMode::Live,
                other => tracing::warn!(mode = other, "Unknown MURMUR_MODE, keeping configured mode"),
            }
        }
        if let Ok(host) = std::env::var("MURMUR_STORE_HOST") {
            self.store.host = host;
        }
        if let Ok(port) = std::env::var("MURMUR_STORE_PORT") {
            match port.parse() {
                Ok(port) => self.store.port = port,
                Err(_) => {
                    tracing::warn!(port = %port, "Invalid MURMUR_STORE_PORT, keeping configured port")
                }
            }
        }
        if let Ok(interval) = std::env::var("MURMUR_POLL_INTERVAL") {
            match interval.parse() {
                Ok(secs) => self.pipeline.poll_interval_secs = secs,
                Err(_) => tracing::warn!(
                    interval = %interval,
                    "Invalid MURMUR_POLL_INTERVAL, keeping configured interval"
                ),
            }
        }
    }

    /// Meeting ID with the mock-mode fallback applied.
    pub fn meeting_id(&self) -> anyhow::Result<String> {
        match (&self.api.meeting_id, self.api.mode) {
            (Some(id), _) => Ok(id.clone()),
            (None, SourceMode::Mock) => Ok("mock-meeting-001".to_string()),
            (None, SourceMode::Live) => anyhow::bail!(
                "api.meeting_id is required in live mode (or set MURMUR_MEETING_ID)"
            ),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.mode == SourceMode::Live && self.api.api_key.is_none() {
            anyhow::bail!("api.api_key is required in live mode (or set MURMUR_API_KEY)");
        }
        if self.pipeline.poll_interval_secs <= 0.0 {
            anyhow::bail!("pipeline.poll_interval_secs must be positive");
        }
        Ok(())
    }
}
