//! Operator terminal
//!
//! Line input from the operator and plain-text rendering of the chat. Generic
//! over the reader and writer so sessions can run against in-memory streams.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Shown when asking for a handle
pub const HANDLE_PROMPT: &str = "Please enter a handle: \n";
/// Shown when a handle fails validation
pub const HANDLE_REJECTED: &str = "Sorry, your handle must be 1-10 characters: \n";
/// Line printed before each inbound chunk
pub const RECEIPT_MARKER: &str = "(incoming message)\n";
/// Printed once the coordinator goes away
pub const DISCONNECT_NOTICE: &str = "\nDisconnected from chat server\n";

/// The operator's side of the session: an input line source and a display
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a terminal over the given streams
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Get the display writer
    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Wait until input is available (or at EOF) without consuming it
    pub async fn input_ready(&mut self) -> io::Result<()> {
        self.input.fill_buf().await.map(|_| ())
    }

    /// Read one line as raw bytes, including its terminator
    ///
    /// No decoding is done. Returns `None` at end of input.
    pub async fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        match self.input.read_until(b'\n', &mut line).await? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }

    /// Write text and flush
    pub async fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.write_bytes(text.as_bytes()).await
    }

    async fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.output.write_all(data).await?;
        self.output.flush().await
    }

    /// Render the `<handle>> ` prompt
    pub async fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        self.write_str(prompt).await
    }

    /// Render an inbound chunk exactly as received, then re-prompt
    pub async fn show_incoming(&mut self, data: &[u8], prompt: &str) -> io::Result<()> {
        self.output.write_all(RECEIPT_MARKER.as_bytes()).await?;
        self.output.write_all(data).await?;
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await
    }

    /// Announce that the connection is up
    pub async fn show_established(&mut self, peer: &str) -> io::Result<()> {
        self.write_str(&format!("Connection established with {}.\n\n", peer))
            .await
    }

    /// Announce that the coordinator went away
    pub async fn show_disconnected(&mut self) -> io::Result<()> {
        self.write_str(DISCONNECT_NOTICE).await
    }
}
