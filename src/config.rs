//! Configuration module for medrisk.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the front end (default: 3000)
    pub http_port: u16,
    /// Base URL of the device-risk service (default: "http://localhost:5000")
    pub device_api_url: String,
    /// Base URL of the recall-risk service (default: "http://localhost:8000")
    pub recall_api_url: String,
    /// Timeout applied to every outbound request (default: 30s)
    pub request_timeout: Duration,
    /// Directory holding the pre-rendered chart images (default: "public/images")
    pub charts_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 3000,
            device_api_url: "http://localhost:5000".to_string(),
            recall_api_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(30),
            charts_dir: "public/images".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MEDRISK_HTTP_PORT`: HTTP port (default: 3000)
    /// - `MEDRISK_DEVICE_API_URL`: device-risk service base URL
    /// - `MEDRISK_RECALL_API_URL`: recall-risk service base URL
    /// - `MEDRISK_REQUEST_TIMEOUT_SECS`: outbound request timeout (default: 30)
    /// - `MEDRISK_CHARTS_DIR`: chart image directory (default: "public/images")
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port_str) = lookup("MEDRISK_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Some(url) = lookup("MEDRISK_DEVICE_API_URL") {
            cfg.device_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(url) = lookup("MEDRISK_RECALL_API_URL") {
            cfg.recall_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(secs) = lookup("MEDRISK_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                if secs > 0 {
                    cfg.request_timeout = Duration::from_secs(secs);
                }
            }
        }

        if let Some(dir) = lookup("MEDRISK_CHARTS_DIR") {
            cfg.charts_dir = dir;
        }

        cfg
    }
}
