//! Application configuration loaded from environment variables.

use std::time::Duration;

use notifications::NtfyConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Account created or promoted to admin on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub email: String,
    pub username: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL` — PostgreSQL URL; the in-memory store is used when unset
/// - `NTFY_SERVER`, `NTFY_TOPIC`, `NTFY_TOKEN`, `NTFY_TIMEOUT_SECS` — order
///   notifications, disabled when the topic is empty
/// - `ADMIN_EMAIL`, `ADMIN_USERNAME` — bootstrap admin account
/// - `SEED_PRODUCTS` — load the bundled catalog when it is empty
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub ntfy: NtfyConfig,
    pub admin: Option<AdminAccount>,
    pub seed_products: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mut ntfy = NtfyConfig::new(var("NTFY_TOPIC").unwrap_or_default());
        if let Some(server) = var("NTFY_SERVER") {
            ntfy = ntfy.with_server(server);
        }
        if let Some(token) = var("NTFY_TOKEN") {
            ntfy = ntfy.with_token(token);
        }
        if let Some(secs) = var("NTFY_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            ntfy = ntfy.with_timeout(Duration::from_secs(secs));
        }

        let admin = var("ADMIN_EMAIL").map(|email| AdminAccount {
            username: var("ADMIN_USERNAME").unwrap_or_else(|| email.clone()),
            email,
        });

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database_url: var("DATABASE_URL"),
            ntfy,
            admin,
            seed_products: var("SEED_PRODUCTS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            ntfy: NtfyConfig::default(),
            admin: None,
            seed_products: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config_from(&[]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.database_url.is_none());
        assert!(!config.ntfy.is_enabled());
        assert!(config.admin.is_none());
        assert!(!config.seed_products);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_ntfy_settings() {
        let config = config_from(&[
            ("NTFY_SERVER", "https://push.example.com/"),
            ("NTFY_TOPIC", "orders"),
            ("NTFY_TOKEN", "tk_secret"),
            ("NTFY_TIMEOUT_SECS", "2"),
        ]);
        assert!(config.ntfy.is_enabled());
        assert_eq!(config.ntfy.topic_url(), "https://push.example.com/orders");
        assert_eq!(config.ntfy.token.as_deref(), Some("tk_secret"));
        assert_eq!(config.ntfy.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_admin_and_flags() {
        let config = config_from(&[
            ("ADMIN_EMAIL", "root@example.com"),
            ("LOG_FORMAT", "JSON"),
            ("SEED_PRODUCTS", "true"),
            ("PORT", "not-a-port"),
            ("DATABASE_URL", "  "),
        ]);
        assert_eq!(
            config.admin,
            Some(AdminAccount {
                email: "root@example.com".to_string(),
                username: "root@example.com".to_string(),
            })
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.seed_products);
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }
}
