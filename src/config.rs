use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Externally visible base URL used to build shareable viewer links,
    /// e.g. `wss://mirror.example.com`. When unset, links fall back to
    /// `ws://<request Host header>`.
    pub public_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the shareable viewer URL for a session id.
    pub fn share_url(&self, request_host: &str, session_id: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{}/join/{}", base.trim_end_matches('/'), session_id),
            None => format!("ws://{}/join/{}", request_host, session_id),
        }
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            public_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable error: {0}")]
    EnvError(#[from] envy::Error),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7654
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}
