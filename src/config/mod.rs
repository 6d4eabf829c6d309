/// Configuration management for the trainflow server
///
/// Handles server binding, the training API location and where downloaded
/// models are written. Every value can be overridden from the environment.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Remote training API configuration
    pub training: TrainingConfig,
    /// Optional JSON file replacing the built-in model catalog
    pub catalog_path: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Training API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Base URL of the training service (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Directory downloaded models are saved into (default: "downloads")
    pub download_dir: String,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("TRAINFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("TRAINFLOW_PORT")
                    .ok()
                    .and_then(|port| port.parse().ok())
                    .unwrap_or(3005),
            },
            training: TrainingConfig {
                base_url: std::env::var("TRAINFLOW_API_URL")
                    .unwrap_or_else(|_| "http://localhost:5000".to_string()),
                download_dir: std::env::var("TRAINFLOW_DOWNLOAD_DIR")
                    .unwrap_or_else(|_| "downloads".to_string()),
            },
            catalog_path: std::env::var("TRAINFLOW_CATALOG").ok().filter(|p| !p.is_empty()),
        }
    }
}
