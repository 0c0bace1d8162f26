// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AuthConfig, BookmarksConfig, Config, HttpConfig, LoggingConfig, MethodOverrideConfig,
    PerformanceConfig, ResponseFormat, ServerConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", "bookmark_router/0.1")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("bookmarks.response_format", "html")?
            .set_default("bookmarks.upload_dir", "uploads")?
            .set_default("auth.enabled", true)?
            .set_default("auth.password", "")?
            .set_default("auth.session_cookie", "bookmark_session")?
            .set_default("auth.login_redirect", false)?
            .set_default("method_override.header", "X-HTTP-Method-Override")?
            .set_default("method_override.field", "_method")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("definitely/not/here/config").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.bookmarks.response_format, ResponseFormat::Html);
        assert!(config.auth.enabled);
        assert_eq!(config.auth.session_cookie, "bookmark_session");
        assert_eq!(config.method_override, MethodOverrideConfig::default());
        assert_eq!(config.http.max_body_size, 10_485_760);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[bookmarks]
response_format = "json"
data_file = "data/bookmarks.toml"

[method_override]
field = ""
"#,
        )
        .unwrap();

        let base = path.with_extension("");
        let config = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.bookmarks.response_format, ResponseFormat::Json);
        assert_eq!(config.bookmarks.data_file.as_deref(), Some("data/bookmarks.toml"));
        assert_eq!(config.method_override.field, "");
        assert_eq!(config.method_override.header, "X-HTTP-Method-Override");
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::default();
        assert_eq!(config.get_socket_addr().unwrap().port(), 8080);
    }
}
