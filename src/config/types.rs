// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub bookmarks: BookmarksConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub method_override: MethodOverrideConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds a whole keep-alive connection may live
    pub keep_alive_timeout: u64,
    /// Seconds allowed for reading one request body
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            max_connections: None,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: "bookmark_router/0.1".to_string(),
            max_body_size: 10_485_760,
        }
    }
}

/// Body format of list, show and write responses
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Html,
    Json,
}

/// Bookmark resource configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BookmarksConfig {
    pub response_format: ResponseFormat,
    /// Directory screenshots are written to
    pub upload_dir: String,
    /// TOML snapshot of the records; in-memory only when unset
    #[serde(default)]
    pub data_file: Option<String>,
}

impl Default for BookmarksConfig {
    fn default() -> Self {
        Self {
            response_format: ResponseFormat::Html,
            upload_dir: "uploads".to_string(),
            data_file: None,
        }
    }
}

/// Authentication gate configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub password: String,
    pub session_cookie: String,
    /// Redirect to /login instead of rendering the form in place
    pub login_redirect: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            password: String::new(),
            session_cookie: "bookmark_session".to_string(),
            login_redirect: false,
        }
    }
}

/// Where a POST may name the verb it stands for. Empty disables a source.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct MethodOverrideConfig {
    #[serde(default = "default_override_header")]
    pub header: String,
    #[serde(default = "default_override_field")]
    pub field: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_override_header() -> String {
    "X-HTTP-Method-Override".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_override_field() -> String {
    "_method".to_string()
}

impl Default for MethodOverrideConfig {
    fn default() -> Self {
        Self {
            header: default_override_header(),
            field: default_override_field(),
        }
    }
}
