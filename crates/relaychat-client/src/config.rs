//! Relay address and reconnect tuning.

use std::time::Duration;

use relaychat_proto::DEFAULT_NAMESPACE;

use crate::error::ConfigError;

/// Relay address used when none is configured.
pub const DEFAULT_RELAY_URL: &str = "http://localhost:4000";

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Relay base address, `http(s)://` or `ws(s)://`. A path selects the
    /// Socket.IO namespace.
    pub relay_url: String,
    /// First reconnect delay.
    pub reconnect_delay: Duration,
    /// Upper bound for the doubling reconnect delay.
    pub reconnect_delay_max: Duration,
    /// Limit for the WebSocket handshake.
    pub connect_timeout: Duration,
    /// How often the heartbeat deadline is checked.
    pub liveness_check: Duration,
    /// Outbound events queued before emits start being dropped.
    pub outbound_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            reconnect_delay: Duration::from_secs(1),
            reconnect_delay_max: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(20),
            liveness_check: Duration::from_secs(1),
            outbound_buffer: 64,
        }
    }
}

impl RelayConfig {
    /// Default settings for `relay_url`.
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self { relay_url: relay_url.into(), ..Self::default() }
    }

    /// Resolve the WebSocket URL and namespace.
    pub fn endpoint(&self) -> Result<RelayEndpoint, ConfigError> {
        let url = self.relay_url.trim();
        let unsupported = || ConfigError::UnsupportedScheme(url.to_string());

        let (scheme, rest) = url.split_once("://").ok_or_else(unsupported)?;
        let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            _ => return Err(unsupported()),
        };

        let (authority, path) = rest.find('/').map_or((rest, ""), |i| rest.split_at(i));
        if authority.is_empty() {
            return Err(ConfigError::MissingHost(url.to_string()));
        }

        let path = path.split(['?', '#']).next().unwrap_or_default().trim_end_matches('/');
        let namespace = if path.is_empty() { DEFAULT_NAMESPACE } else { path };

        Ok(RelayEndpoint {
            websocket_url: format!("{ws_scheme}://{authority}/socket.io/?EIO=4&transport=websocket"),
            namespace: namespace.to_string(),
        })
    }

    /// Delay before reconnect attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.reconnect_delay.saturating_mul(2u32.saturating_pow(attempt)).min(self.reconnect_delay_max)
    }
}

/// Resolved relay location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    /// Engine.IO WebSocket URL.
    pub websocket_url: String,
    /// Socket.IO namespace.
    pub namespace: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_relay_maps_to_websocket_endpoint() {
        let endpoint = RelayConfig::default().endpoint().unwrap();

        assert_eq!(
            endpoint.websocket_url,
            "ws://localhost:4000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(endpoint.namespace, "/");
    }

    #[test]
    fn https_maps_to_wss() {
        let endpoint = RelayConfig::new("https://chat.example.com/").endpoint().unwrap();
        assert_eq!(
            endpoint.websocket_url,
            "wss://chat.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn path_selects_namespace() {
        let endpoint = RelayConfig::new("ws://127.0.0.1:4000/lobby?x=1").endpoint().unwrap();
        assert_eq!(endpoint.namespace, "/lobby");
        assert_eq!(
            endpoint.websocket_url,
            "ws://127.0.0.1:4000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn rejects_unknown_scheme_and_missing_host() {
        assert_eq!(
            RelayConfig::new("ftp://host").endpoint(),
            Err(ConfigError::UnsupportedScheme("ftp://host".into()))
        );
        assert_eq!(
            RelayConfig::new("localhost:4000").endpoint(),
            Err(ConfigError::UnsupportedScheme("localhost:4000".into()))
        );
        assert_eq!(
            RelayConfig::new("http:///chat").endpoint(),
            Err(ConfigError::MissingHost("http:///chat".into()))
        );
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let config = RelayConfig::default();

        assert_eq!(config.backoff(0), Duration::from_secs(1));
        assert_eq!(config.backoff(1), Duration::from_secs(2));
        assert_eq!(config.backoff(2), Duration::from_secs(4));
        assert_eq!(config.backoff(3), Duration::from_secs(5));
        assert_eq!(config.backoff(u32::MAX), Duration::from_secs(5));
    }
}
