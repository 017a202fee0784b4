//! `miicrypt` — interactive Mii profile encrypt/decrypt tool.
//!
//! The cryptographic transform lives in the privileged platform wrap
//! service; this program only moves fixed-size profile blobs between files
//! and that service. Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise logging (stderr; stdout belongs to the operator).
//! 3. Connect the wrap-service gateway.
//! 4. Run the interactive driver loop until Start is pressed.

mod compare;
mod config;
mod driver;
mod gateway;
mod telemetry;
mod transfer;

use anyhow::{Context, Result};
use tracing::info;

use config::Config;
use driver::TermInput;
use gateway::AptService;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        socket = %cfg.service_socket.display(),
        data_dir = %cfg.data_dir.display(),
        "miicrypt starting"
    );

    // -----------------------------------------------------------------------
    // 3. Wrap service gateway
    // -----------------------------------------------------------------------
    let mut svc = AptService::connect(&cfg.service_socket)
        .context("wrap service unavailable — is it running and accessible?")?;

    // -----------------------------------------------------------------------
    // 4. Interactive driver
    // -----------------------------------------------------------------------
    // The gateway and terminal handles drop on every path out of here.
    let mut input = TermInput::new();
    let stdout = std::io::stdout();
    driver::run(&mut svc, &mut input, &cfg.data_dir, &mut stdout.lock())
}
