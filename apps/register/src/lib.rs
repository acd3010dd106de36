//! # Meridian Register Library
//!
//! Terminal register for one till: the operator types commands, the order
//! is priced locally, and the finished sale is submitted to the backend.
//!
//! ## Module Organization
//! ```text
//! meridian_register_lib/
//! ├── lib.rs          ◄─── You are here (startup & command loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── session.rs  ◄─── Order, reference data, submitter
//! │   └── config.rs   ◄─── Currency, rounding, operator, role
//! ├── commands/
//! │   ├── mod.rs      ◄─── Parsing and dispatch
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── promotion.rs◄─── Coupons, gift cards, loyalty
//! │   ├── checkout.rs ◄─── Tenders, place, hold
//! │   └── catalog.rs  ◄─── Search and refresh
//! ├── receipt.rs      ◄─── Text rendering
//! └── error.rs        ◄─── Operator-facing error type
//! ```

pub mod commands;
pub mod error;
pub mod receipt;
pub mod state;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use meridian_client::{BackendConfig, HttpBackend};
use meridian_core::Role;

use commands::{Command, Outcome};
use state::{ConfigState, SessionState};

/// Command-line flags. Each one overrides the config file and environment.
#[derive(Debug, Parser)]
#[command(name = "meridian-register", version, about = "Meridian POS terminal register")]
pub struct Cli {
    /// Path to register.toml (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sales backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Store to open the session in
    #[arg(long)]
    pub store: Option<String>,

    /// Operator role: super_admin, admin, manager or cashier
    #[arg(long)]
    pub role: Option<Role>,

    /// Operator name printed on receipts
    #[arg(long)]
    pub operator: Option<String>,
}

/// Runs the register.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Parse flags                                                         │
/// │  2. Initialize logging (stderr, RUST_LOG or "info,meridian=debug")      │
/// │  3. Load BackendConfig: register.toml → MERIDIAN_* → flags → validate   │
/// │  4. Load ConfigState: defaults → MERIDIAN_* → flags                     │
/// │  5. Open the session: reference data for the store, empty order         │
/// │  6. Read commands from stdin until quit or EOF                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting Meridian register");

    let mut backend_config = BackendConfig::load(cli.config.clone())?;
    if let Some(url) = cli.api_url {
        backend_config.base_url = url;
    }
    if let Some(store) = cli.store {
        backend_config.store_id = Some(store);
    }
    backend_config.validate()?;

    let store_id = backend_config
        .store_id
        .clone()
        .ok_or("No store configured: set store_id in register.toml, MERIDIAN_STORE_ID or --store")?;

    let mut config = ConfigState::from_env();
    if let Some(role) = cli.role {
        config.role = role;
    }
    if let Some(operator) = cli.operator {
        config.operator = operator;
    }

    let backend = Arc::new(HttpBackend::new(&backend_config)?);
    info!(url = %backend.base_url(), store_id = %store_id, "Connecting to sales backend");

    let session = SessionState::start(
        backend,
        &store_id,
        backend_config.reference_ttl(),
        config.pricing(),
        Utc::now(),
    )
    .await?;

    let stdin = BufReader::new(tokio::io::stdin());
    run_loop(&session, &config, stdin, tokio::io::stdout()).await?;

    info!("Register closed");
    Ok(())
}

/// Reads one command per line, executes it and writes the result.
///
/// Errors are written to `output` and the loop carries on; only `quit` or
/// end of input stop it.
pub async fn run_loop<R, W>(
    session: &SessionState,
    config: &ConfigState,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(b"> ").await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            output.write_all(b"> ").await?;
            output.flush().await?;
            continue;
        }

        let result = match Command::parse(line, config) {
            Ok(command) => commands::execute(session, config, command, Utc::now()).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Print(text)) => {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            Err(e) => {
                warn!(command = line, error = %e, "Command failed");
                output
                    .write_all(format!("error {}\n", e).as_bytes())
                    .await?;
            }
        }
        output.write_all(b"> ").await?;
        output.flush().await?;
    }

    output.flush().await
}

/// Initializes the tracing subscriber on stderr so stdout stays readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=meridian=trace` - Trace for meridian crates only
/// - Default: `info,meridian=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,meridian=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
