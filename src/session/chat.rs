//! Chat session
//!
//! Owns the connection and the terminal for one run. Moves through
//! `AwaitingHandle` -> `Active` -> `Terminated`, and always closes the
//! connection on the way out.
//!
//! While active, each iteration waits for readiness on the operator input, the
//! connection, or both, then services every ready source once (input first).

use std::fmt;
use std::io;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::{Handle, Terminal, HANDLE_PROMPT, HANDLE_REJECTED};
use crate::config::ClientConfig;
use crate::net::Connection;

/// Input line that ends the session instead of being sent
pub const QUIT_COMMAND: &[u8] = b"\\quit";

/// Strip trailing ASCII whitespace from a raw input line
fn trim_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// Errors that end a session abnormally
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Operator entered the quit command
    UserQuit,
    /// Coordinator closed the connection or the read failed
    Disconnected,
    /// Sending a line to the coordinator failed
    WriteFailure,
    /// Operator input reached end of file
    InputClosed,
    /// Reading the operator input or writing the display failed
    TerminalFailure,
}

impl EndReason {
    /// Process exit status for this outcome
    pub fn exit_code(self) -> i32 {
        match self {
            EndReason::UserQuit | EndReason::Disconnected | EndReason::InputClosed => 0,
            EndReason::WriteFailure | EndReason::TerminalFailure => 1,
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            EndReason::UserQuit => "user quit",
            EndReason::Disconnected => "disconnected",
            EndReason::WriteFailure => "write failure",
            EndReason::InputClosed => "input closed",
            EndReason::TerminalFailure => "terminal failure",
        };
        f.write_str(reason)
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the operator to pick a valid handle
    AwaitingHandle,
    /// Exchanging messages
    Active,
    /// Finished; the connection has been released
    Terminated(EndReason),
}

/// Which sources were ready after one readiness wait
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Readiness {
    input: bool,
    network: bool,
}

/// A single interactive chat session
pub struct Session<R, W> {
    /// Identifier for log correlation
    id: Uuid,
    /// Connection to the coordinator, owned for the session's lifetime
    connection: Connection,
    /// Operator input and display
    terminal: Terminal<R, W>,
    /// Set once when the session becomes active
    handle: Option<Handle>,
    /// Current lifecycle state
    state: SessionState,
    /// Bound on one readiness wait
    wait_timeout: Duration,
    /// Maximum bytes per connection read
    buffer_size: usize,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a session over an established connection
    pub fn new(connection: Connection, terminal: Terminal<R, W>, config: &ClientConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection,
            terminal,
            handle: None,
            state: SessionState::AwaitingHandle,
            wait_timeout: config.wait_timeout,
            buffer_size: config.buffer_size,
        }
    }

    /// Get the session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the handle, once one has been accepted
    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    /// Get the connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Get the terminal
    #[cfg(test)]
    pub fn terminal(&self) -> &Terminal<R, W> {
        &self.terminal
    }

    /// Run the session to completion
    ///
    /// The connection is closed on every exit path. Running a terminated
    /// session again returns the original reason.
    pub async fn run(&mut self) -> EndReason {
        if let SessionState::Terminated(reason) = self.state {
            return reason;
        }

        let span = info_span!(
            "session",
            id = %self.id,
            peer = %self.connection.peer(),
            handle = field::Empty
        );

        let reason = match self.drive().instrument(span.clone()).await {
            Ok(reason) => reason,
            Err(e) => {
                span.in_scope(|| error!("Session failed: {}", e));
                EndReason::TerminalFailure
            }
        };

        self.connection.close().await;
        self.state = SessionState::Terminated(reason);
        span.in_scope(|| info!("Session terminated: {}", reason));

        reason
    }

    async fn drive(&mut self) -> SessionResult<EndReason> {
        let handle = match self.handle.clone() {
            Some(handle) => handle,
            None => match self.establish().await? {
                Some(handle) => handle,
                None => return Ok(EndReason::InputClosed),
            },
        };
        let prompt = handle.prompt();

        loop {
            let ready = self.wait_ready().await;

            if ready.input {
                if let Some(reason) = self.service_input(&handle).await? {
                    return Ok(reason);
                }
            }

            if ready.network {
                if let Some(reason) = self.service_network(&prompt).await? {
                    return Ok(reason);
                }
            }
        }
    }

    /// Prompt until the operator enters a valid handle
    ///
    /// Every rejected attempt is replaced by the next line read. Returns `None`
    /// if input ends first.
    async fn establish(&mut self) -> SessionResult<Option<Handle>> {
        self.terminal.write_str(HANDLE_PROMPT).await?;

        let handle = loop {
            let Some(line) = self.terminal.read_line().await? else {
                info!("Operator input closed before a handle was chosen");
                return Ok(None);
            };

            match Handle::parse(&line) {
                Ok(handle) => break handle,
                Err(e) => {
                    debug!("Rejected handle: {}", e);
                    self.terminal.write_str(HANDLE_REJECTED).await?;
                }
            }
        };

        Span::current().record("handle", handle.as_str());
        info!("Handle accepted");

        self.terminal.show_established(self.connection.peer()).await?;
        self.terminal.prompt(&handle.prompt()).await?;

        self.handle = Some(handle.clone());
        self.state = SessionState::Active;

        Ok(Some(handle))
    }

    /// Block until at least one source is ready, or the wait bound elapses
    async fn wait_ready(&mut self) -> Readiness {
        let Self {
            connection,
            terminal,
            wait_timeout,
            ..
        } = self;

        let mut ready = tokio::select! {
            _ = terminal.input_ready() => Readiness { input: true, network: false },
            _ = connection.readable() => Readiness { input: false, network: true },
            _ = tokio::time::sleep(*wait_timeout) => {
                debug!("Readiness wait elapsed after {:?}", wait_timeout);
                return Readiness::default();
            }
        };

        // Pick up the other source too if it is already ready
        if !ready.input {
            ready.input = terminal.input_ready().now_or_never().is_some();
        }
        if !ready.network {
            ready.network = connection.readable().now_or_never().is_some();
        }

        ready
    }

    async fn service_input(&mut self, handle: &Handle) -> SessionResult<Option<EndReason>> {
        let Some(line) = self.terminal.read_line().await? else {
            info!("Operator input closed");
            return Ok(Some(EndReason::InputClosed));
        };

        if trim_end(&line) == QUIT_COMMAND {
            info!("Quit requested");
            return Ok(Some(EndReason::UserQuit));
        }

        let message = handle.tag_line(&line);
        if let Err(e) = self.connection.write(&message).await {
            error!("{}", e);
            return Ok(Some(EndReason::WriteFailure));
        }
        debug!(bytes = message.len(), "Sent message");

        self.terminal.prompt(&handle.prompt()).await?;
        Ok(None)
    }

    async fn service_network(&mut self, prompt: &str) -> SessionResult<Option<EndReason>> {
        match self.connection.try_read(self.buffer_size) {
            Ok(None) => {
                debug!("Spurious connection readiness");
                Ok(None)
            }
            Ok(Some(data)) if data.is_empty() => {
                info!("Coordinator closed the connection");
                self.terminal.show_disconnected().await?;
                Ok(Some(EndReason::Disconnected))
            }
            Ok(Some(data)) => {
                debug!(bytes = data.len(), "Received message");
                self.terminal.show_incoming(&data, prompt).await?;
                Ok(None)
            }
            Err(e) => {
                warn!("{}", e);
                self.terminal.show_disconnected().await?;
                Ok(Some(EndReason::Disconnected))
            }
        }
    }
}
