//! Client configuration.

use crate::protocol::constants::DEFAULT_SERVER_URL;

/// Configuration for [`CouchClient`](super::CouchClient).
///
/// # Examples
///
/// ```
/// use couchrest::client::ClientConfig;
///
/// let config = ClientConfig {
///     server_url: "http://db.internal:5984".to_string(),
///     debug: true,
///     ..Default::default()
/// };
/// assert_eq!(config.stream_buffer, 100);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server, without a trailing slash
    pub server_url: String,
    /// Timeout for buffered requests. Streams are never timed out by the client.
    pub request_timeout_ms: u64,
    /// Attach request URL and payload to transport errors
    pub debug: bool,
    /// Emit `tracing` events for requests and streams
    pub enable_logging: bool,
    /// Lines buffered between the stream reader task and the consumer
    pub stream_buffer: usize,
    /// Proxy for all requests; empty for none
    pub proxy_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_ms: 30_000,
            debug: false,
            enable_logging: true,
            stream_buffer: 100,
            proxy_url: String::new(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `COUCH_URL` and `COUCHREST_DEBUG` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ClientConfig::default();
        if let Some(url) = lookup("COUCH_URL").filter(|u| !u.is_empty()) {
            config.server_url = url.trim_end_matches('/').to_string();
        }
        if let Some(flag) = lookup("COUCHREST_DEBUG") {
            config.debug = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        config
    }
}
