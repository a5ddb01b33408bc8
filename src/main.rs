//! Chatline
//!
//! Terminal chat client. Connects to a chat coordinator over TCP and relays
//! operator lines to it while displaying whatever it sends back.

mod config;
mod net;
mod session;

use std::io;
use std::process;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::ClientConfig;
use net::Connection;
use session::{Session, Terminal};

/// Chatline
///
/// Terminal chat client for a line-oriented chat coordinator
#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(version, about, long_about = None)]
struct Args {
    /// Coordinator host
    host: String,

    /// Coordinator port
    port: u16,

    /// Seconds to wait for the connection to be established
    #[arg(short, long, default_value_t = 2)]
    timeout: u64,

    /// Seconds a single readiness wait may last before the loop re-arms
    #[arg(long, default_value_t = 3600)]
    wait_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    info!("Chatline v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::new(args.host, args.port)
        .with_connect_timeout(Duration::from_secs(args.timeout))
        .with_wait_timeout(Duration::from_secs(args.wait_timeout));

    let connection =
        match Connection::connect(&config.host, config.port, config.connect_timeout).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!("{}", e);
                eprintln!(
                    "Unable to connect with host {} on port {}.",
                    config.host, config.port
                );
                process::exit(1);
            }
        };
    info!("Connected to {}", config.socket_addr());

    let terminal = Terminal::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let mut session = Session::new(connection, terminal, &config);
    info!(
        "Starting session {} with {}",
        session.id(),
        session.connection().peer()
    );

    let reason = session.run().await;
    if let Some(handle) = session.handle() {
        info!(
            "Session for {} ended: {:?} (connection released: {})",
            handle,
            session.state(),
            session.connection().is_closed()
        );
    }

    // The stdin reader thread cannot be cancelled, so leave without waiting
    // for runtime shutdown.
    process::exit(reason.exit_code());
}

/// Log to stderr so diagnostics never interleave with the chat on stdout
fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_filter = if verbose {
        "chatline=debug"
    } else {
        "chatline=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
