use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Bound on how long one recipient may stall a delivery attempt before
    /// it is dropped.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// How often dead connections are swept out of the registry.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_send_timeout_ms() -> u64 {
    5000
}

fn default_cleanup_interval_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config: Self = if Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self {
                server: ServerConfig::default(),
                broadcast: BroadcastConfig::default(),
            }
        };

        // Environment variables override the config file.
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }
        if let Ok(ms) = std::env::var("SEND_TIMEOUT_MS") {
            if let Ok(v) = ms.parse() {
                config.broadcast.send_timeout_ms = v;
            }
        }
        if let Ok(secs) = std::env::var("CLEANUP_INTERVAL_SECS") {
            if let Ok(v) = secs.parse() {
                config.broadcast.cleanup_interval_secs = v;
            }
        }

        Ok(config)
    }
}
