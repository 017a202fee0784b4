//! `apt-stub` — wrap-service stand-in binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise logging.
//! 3. Bind the Unix listener (unlinking a stale socket) and serve forever.

mod config;

use std::os::unix::net::UnixListener;

use anyhow::{Context, Result};
use apt_stub::{StubBehavior, StubService};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        eprintln!("ERROR: apt-stub configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise apt-stub tracing subscriber: {e}"))?;

    // -----------------------------------------------------------------------
    // 3. Serve
    // -----------------------------------------------------------------------
    // A previous run may have left its socket behind; a fresh bind needs the
    // path free.
    match std::fs::remove_file(&cfg.socket_path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(e).with_context(|| {
                format!("remove stale socket at {}", cfg.socket_path.display())
            });
        }
        _ => {}
    }

    let listener = UnixListener::bind(&cfg.socket_path)
        .with_context(|| format!("bind listener at {}", cfg.socket_path.display()))?;
    let behavior = match cfg.fail_status {
        Some(status) => StubBehavior::Fail(status),
        None => StubBehavior::Transform,
    };
    info!(
        socket = %cfg.socket_path.display(),
        ?behavior,
        "apt-stub listening"
    );

    StubService::new(behavior)
        .serve(listener)
        .context("listener failed")
}
