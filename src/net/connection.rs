//! Coordinator connection
//!
//! Handles the stream connection lifecycle, including:
//! - Bounded connection establishment
//! - Readiness probing and chunked reads
//! - Whole-buffer writes
//! - Idempotent close

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// Errors that can occur during connection operations
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read from connection: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write to connection: {0}")]
    Write(#[source] io::Error),

    #[error("Connection already closed")]
    Closed,
}

/// Result type for connection operations
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// A single outbound stream connection to the coordinator
pub struct Connection {
    /// The stream, `None` once closed
    stream: Option<TcpStream>,
    /// `host:port` as given by the caller
    peer: String,
}

impl Connection {
    /// Connect to `host:port`, giving up after `timeout`
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> ConnectionResult<Self> {
        let connect_error = |source| ConnectionError::Connect {
            host: host.to_string(),
            port,
            source,
        };

        let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(connect_error(e)),
            Err(_) => {
                return Err(connect_error(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no response within {:?}", timeout),
                )))
            }
        };

        let peer = format!("{}:{}", host, port);
        debug!("Connected to {}", peer);

        Ok(Self::from_stream(stream, peer))
    }

    /// Wrap an already established stream
    pub fn from_stream(stream: TcpStream, peer: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            peer: peer.into(),
        }
    }

    /// Get the `host:port` this connection was opened to
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Check if the connection has been closed locally
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    fn stream(&self) -> ConnectionResult<&TcpStream> {
        self.stream.as_ref().ok_or(ConnectionError::Closed)
    }

    fn stream_mut(&mut self) -> ConnectionResult<&mut TcpStream> {
        self.stream.as_mut().ok_or(ConnectionError::Closed)
    }

    /// Wait until the connection has data, an EOF, or an error to report
    ///
    /// Consumes nothing. Readiness may be spurious.
    pub async fn readable(&self) -> ConnectionResult<()> {
        self.stream()?.readable().await.map_err(ConnectionError::Read)
    }

    /// Read up to `max_bytes` without waiting
    ///
    /// Returns `None` when nothing is available yet, and an empty buffer when
    /// the peer has closed its write side.
    pub fn try_read(&mut self, max_bytes: usize) -> ConnectionResult<Option<Vec<u8>>> {
        let mut buffer = vec![0u8; max_bytes];
        match self.stream()?.try_read(&mut buffer) {
            Ok(n) => {
                buffer.truncate(n);
                Ok(Some(buffer))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(ConnectionError::Read(e)),
        }
    }

    /// Write all of `data` to the connection
    pub async fn write(&mut self, data: &[u8]) -> ConnectionResult<()> {
        let stream = self.stream_mut()?;
        stream.write_all(data).await.map_err(ConnectionError::Write)?;
        stream.flush().await.map_err(ConnectionError::Write)?;
        Ok(())
    }

    /// Close the connection; later calls do nothing
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already be gone
            let _ = stream.shutdown().await;
            debug!("Closed connection to {}", self.peer);
        }
    }
}
