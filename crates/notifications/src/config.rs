use std::time::Duration;

/// Default ntfy server.
pub const DEFAULT_SERVER: &str = "https://ntfy.sh";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for an ntfy server.
///
/// An empty topic disables delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct NtfyConfig {
    /// Base URL of the server, without a trailing slash.
    pub server: String,

    /// Topic to publish to.
    pub topic: String,

    /// Optional bearer token.
    pub token: Option<String>,

    /// Upper bound on a single publish request.
    pub timeout: Duration,
}

impl NtfyConfig {
    /// Creates a configuration publishing to `topic` on the default server.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Sets the server base URL.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the bearer token. Empty tokens are ignored.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if a topic is configured.
    pub fn is_enabled(&self) -> bool {
        !self.topic.trim().is_empty()
    }

    /// URL notifications are posted to.
    pub fn topic_url(&self) -> String {
        format!("{}/{}", self.server, self.topic.trim())
    }
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            topic: String::new(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for NtfyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtfyConfig")
            .field("server", &self.server)
            .field("topic", &self.topic)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let config = NtfyConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.server, "https://ntfy.sh");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_topic_url_trims_trailing_slash() {
        let config = NtfyConfig::new("orders").with_server("http://localhost:8080/");
        assert!(config.is_enabled());
        assert_eq!(config.topic_url(), "http://localhost:8080/orders");
    }

    #[test]
    fn test_blank_topic_is_disabled() {
        assert!(!NtfyConfig::new("   ").is_enabled());
    }

    #[test]
    fn test_empty_token_ignored() {
        assert_eq!(NtfyConfig::new("t").with_token("").token, None);
        assert_eq!(
            NtfyConfig::new("t").with_token("secret").token.as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = NtfyConfig::new("t").with_token("secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }
}
