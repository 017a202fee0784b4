//! Configuration loading and validation for the apt-stub binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated stub configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Unix socket path to listen on.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// When set, answer every resolvable request with this non-success
    /// status instead of transforming.
    #[serde(default)]
    pub fail_status: Option<u32>,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_socket_path() -> PathBuf {
    "/run/apt/wrap.sock".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build apt-stub configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise apt-stub configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            anyhow::bail!("SOCKET_PATH must not be empty");
        }
        if self.fail_status == Some(0) {
            anyhow::bail!("FAIL_STATUS must be a non-success status word");
        }
        Ok(())
    }
}
