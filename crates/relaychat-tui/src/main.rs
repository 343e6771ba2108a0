//! relaychat TUI entry point.

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use relaychat_client::{DEFAULT_RELAY_URL, RelayConfig};
use relaychat_tui::{Runtime, TerminalDriver};
use tracing_subscriber::EnvFilter;

/// relaychat terminal client
#[derive(Parser, Debug)]
#[command(name = "relaychat-tui")]
#[command(about = "Terminal chat client for a Socket.IO relay")]
#[command(version)]
struct Args {
    /// Relay address (http, https, ws or wss)
    #[arg(short, long, env = "RELAYCHAT_RELAY", default_value = DEFAULT_RELAY_URL)]
    relay: String,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Append logs to this file
    ///
    /// The terminal is in raw mode while the client runs, so logs are
    /// discarded unless a file is given.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))?;
    let file = File::options().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| e as Box<dyn std::error::Error>)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let driver = TerminalDriver::new(RelayConfig::new(args.relay))?;
    let runtime = Runtime::new(driver);

    Ok(runtime.run().await?)
}
