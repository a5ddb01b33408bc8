//! Client configuration
//!
//! Where to connect and how long to wait while doing it.

use std::time::Duration;

/// Connection establishment bound; unreachable hosts fail fast.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Upper bound on a single readiness wait before the loop re-arms.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// Largest chunk taken from the connection in one read.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Configuration for a chat client session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Coordinator host name or address
    pub host: String,
    /// Coordinator port
    pub port: u16,
    /// Bound on connection establishment
    pub connect_timeout: Duration,
    /// Bound on one readiness wait in the session loop
    pub wait_timeout: Duration,
    /// Maximum bytes read from the connection per event
    pub buffer_size: usize,
}

impl ClientConfig {
    /// Create a new client configuration with default timeouts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            buffer_size: READ_BUFFER_SIZE,
        }
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the readiness wait bound
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Get the `host:port` form used in notices and logs
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("localhost", 5000);
        assert_eq!(config.socket_addr(), "localhost:5000");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.wait_timeout, DEFAULT_WAIT_TIMEOUT);
        assert_eq!(config.buffer_size, 4096);
    }

    #[test]
    fn test_client_config_with_timeouts() {
        let config = ClientConfig::new("10.0.0.1", 30020)
            .with_connect_timeout(Duration::from_millis(500))
            .with_wait_timeout(Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
        assert_eq!(config.wait_timeout, Duration::from_secs(5));
    }
}
