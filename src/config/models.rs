use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    pub backends: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    6000
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub include_headers: bool,
    #[serde(default)]
    pub include_body: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_headers: true,
            include_body: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Outbound client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_true")]
    pub ssl_verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            pool_max_idle_per_host: default_pool_max_idle(),
            ssl_verify: true,
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_max_idle() -> usize {
    10
}

impl ClientConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Administrative endpoints for the server pool. They are served on their
/// own listener, bound to loopback unless configured otherwise, and never on
/// the forwarding port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_admin_host")]
    pub host: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_admin_host(),
            port: default_admin_port(),
        }
    }
}

fn default_admin_host() -> String {
    "127.0.0.1".to_string()
}

fn default_admin_port() -> u16 {
    6001
}

/// Backend selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Fixed RNG seed for reproducible selection. Unseeded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Checks that `backend` is an absolute http(s) URL.
pub fn validate_backend(backend: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(backend)
        .map_err(|e| format!("Backend '{}' is not a valid URL: {}", backend, e))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(format!(
                "Backend '{}' has unsupported scheme '{}'",
                backend, scheme
            ))
        }
    }

    if url.host_str().is_none() {
        return Err(format!("Backend '{}' has no host", backend));
    }

    Ok(())
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.backends.is_empty() {
            return Err("At least one backend must be configured".to_string());
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            validate_backend(backend)?;
            if !seen.insert(backend.as_str()) {
                return Err(format!("Backend '{}' is listed more than once", backend));
            }
        }

        if self.client.timeout_seconds == 0 {
            return Err("Client timeout_seconds must be > 0".to_string());
        }

        if self.client.connect_timeout_seconds == 0 {
            return Err("Client connect_timeout_seconds must be > 0".to_string());
        }

        if self.admin.enabled && self.admin.port == self.server.port {
            return Err(format!(
                "Admin port {} must differ from the server port",
                self.admin.port
            ));
        }

        Ok(())
    }
}
