//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::shell::Theme;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub dev: DevConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dashboard shell configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base prefix the dashboard is served under
    #[serde(default = "default_base")]
    pub base: String,

    /// Id of the element the application mounts into
    #[serde(default = "default_mount_id")]
    pub mount_id: String,

    #[serde(default)]
    pub theme: Theme,

    /// Path prefix for every backend call made by page units
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Origin used by the API client outside a browser
    #[serde(default = "default_api_origin")]
    pub api_origin: String,
}

fn default_base() -> String {
    "/".to_string()
}

fn default_mount_id() -> String {
    "app".to_string()
}

fn default_api_base() -> String {
    "/api".to_string()
}

fn default_api_origin() -> String {
    "http://localhost:3000".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            mount_id: default_mount_id(),
            theme: Theme::default(),
            api_base: default_api_base(),
            api_origin: default_api_origin(),
        }
    }
}

/// Production SPA host configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_host_port")]
    pub port: u16,

    /// Built front-end (contains index.html and assets/)
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_host_port() -> u16 {
    8080
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("web/dist")
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_host_port(),
            dist_dir: default_dist_dir(),
        }
    }
}

impl HostConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Development server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DevConfig {
    #[serde(default = "default_dev_host")]
    pub host: String,

    #[serde(default = "default_dev_port")]
    pub port: u16,

    /// Open the browser once the server is listening
    #[serde(default = "default_open")]
    pub open: bool,

    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout_secs: u64,

    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,

    #[serde(default = "default_proxy_rules")]
    pub proxy: Vec<ProxyRule>,
}

fn default_dev_host() -> String {
    "localhost".to_string()
}

fn default_dev_port() -> u16 {
    3000
}

fn default_open() -> bool {
    true
}

fn default_proxy_timeout() -> u64 {
    30
}

fn default_max_body() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_proxy_rules() -> Vec<ProxyRule> {
    vec![
        ProxyRule {
            prefix: "/api".to_string(),
            target: "http://localhost:8000".to_string(),
            ws: false,
            change_origin: true,
            rewrite_from: Some("^/api".to_string()),
            rewrite_to: String::new(),
        },
        ProxyRule {
            prefix: "/ws".to_string(),
            target: "ws://localhost:8000".to_string(),
            ws: true,
            change_origin: true,
            rewrite_from: None,
            rewrite_to: String::new(),
        },
    ]
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: default_dev_host(),
            port: default_dev_port(),
            open: default_open(),
            proxy_timeout_secs: default_proxy_timeout(),
            max_body_bytes: default_max_body(),
            proxy: default_proxy_rules(),
        }
    }
}

impl DevConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Point every proxy rule at a different backend, keeping each rule's scheme family
    pub fn retarget(&mut self, backend: &str) {
        let authority = backend
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(backend)
            .trim_end_matches('/');
        let secure = backend.starts_with("https://") || backend.starts_with("wss://");

        for rule in &mut self.proxy {
            let scheme = match (rule.ws, secure) {
                (true, true) => "wss",
                (true, false) => "ws",
                (false, true) => "https",
                (false, false) => "http",
            };
            rule.target = format!("{}://{}", scheme, authority);
        }
    }
}

/// One development proxy entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxyRule {
    /// Request path prefix, matched on a segment boundary
    pub prefix: String,

    /// Upstream origin (http, https, ws or wss)
    pub target: String,

    /// Tunnel WebSocket upgrades
    #[serde(default)]
    pub ws: bool,

    /// Rewrite Origin to the target's origin
    #[serde(default = "default_change_origin")]
    pub change_origin: bool,

    /// Regex applied to the path before forwarding
    #[serde(default)]
    pub rewrite_from: Option<String>,

    #[serde(default)]
    pub rewrite_to: String,
}

fn default_change_origin() -> bool {
    true
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid(format!("unknown log format {:?}", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("agv-monitor-web").join("config.toml")),
            Some(PathBuf::from("/etc/agv-monitor-web/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Check values a typo could silently break
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.app.base.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "app.base must start with '/': {:?}",
                self.app.base
            )));
        }
        if self.app.mount_id.trim().is_empty() {
            return Err(ConfigError::Invalid("app.mount_id must not be empty".into()));
        }
        if !self.app.api_base.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "app.api_base must start with '/': {:?}",
                self.app.api_base
            )));
        }

        for rule in &self.dev.proxy {
            if !rule.prefix.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "proxy prefix must start with '/': {:?}",
                    rule.prefix
                )));
            }
            let scheme_ok = if rule.ws {
                ["ws://", "wss://", "http://", "https://"]
                    .iter()
                    .any(|s| rule.target.starts_with(s))
            } else {
                rule.target.starts_with("http://") || rule.target.starts_with("https://")
            };
            if !scheme_ok {
                return Err(ConfigError::Invalid(format!(
                    "proxy target for {} has an unsupported scheme: {:?}",
                    rule.prefix, rule.target
                )));
            }
            if let Some(pattern) = &rule.rewrite_from {
                regex::Regex::new(pattern).map_err(|e| {
                    ConfigError::Invalid(format!("proxy rewrite for {}: {}", rule.prefix, e))
                })?;
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("AGV_WEB_BASE") {
            self.app.base = base;
        }
        if let Ok(api_origin) = std::env::var("AGV_WEB_API_ORIGIN") {
            self.app.api_origin = api_origin;
        }

        // Host overrides
        if let Ok(host) = std::env::var("AGV_WEB_HOST") {
            self.host.host = host;
        }
        if let Ok(port) = std::env::var("AGV_WEB_PORT") {
            if let Ok(p) = port.parse() {
                self.host.port = p;
            }
        }
        if let Ok(dist) = std::env::var("AGV_WEB_DIST_DIR") {
            self.host.dist_dir = PathBuf::from(dist);
        }

        // Dev server overrides
        if let Ok(port) = std::env::var("AGV_WEB_DEV_PORT") {
            if let Ok(p) = port.parse() {
                self.dev.port = p;
            }
        }
        if let Ok(backend) = std::env::var("AGV_WEB_BACKEND") {
            self.dev.retarget(&backend);
        }

        // Logging overrides
        if let Ok(level) = std::env::var("AGV_WEB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("AGV_WEB_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# AGV Monitor web configuration
#
# Environment variables override these settings:
# - AGV_WEB_BASE
# - AGV_WEB_API_ORIGIN
# - AGV_WEB_HOST
# - AGV_WEB_PORT
# - AGV_WEB_DIST_DIR
# - AGV_WEB_DEV_PORT
# - AGV_WEB_BACKEND
# - AGV_WEB_LOG_LEVEL
# - AGV_WEB_LOG_FORMAT

[app]
# Base prefix the dashboard is served under
base = "/"

# Id of the element the application mounts into
mount_id = "app"

# UI theme: light or dark
theme = "light"

# Prefix for every backend call
api_base = "/api"

# Origin used by the API client from the command line
api_origin = "http://localhost:3000"

[host]
# Production host bind address
host = "0.0.0.0"
port = 8080

# Built front-end
dist_dir = "web/dist"

[dev]
# Development server
host = "localhost"
port = 3000

# Open the browser on start
open = true

# Upstream timeout (seconds) and request body limit (bytes)
proxy_timeout_secs = 30
max_body_bytes = 10485760

[[dev.proxy]]
prefix = "/api"
target = "http://localhost:8000"
change_origin = true
rewrite_from = "^/api"
rewrite_to = ""

[[dev.proxy]]
prefix = "/ws"
target = "ws://localhost:8000"
ws = true
change_origin = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/agv-monitor-web/web.log"
"#
    .to_string()
}
