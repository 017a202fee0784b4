//! Configuration loading and validation for the miicrypt tool.
//!
//! All values are read from environment variables at startup. The process
//! exits with a clear error message if any value cannot be parsed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated tool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Unix socket path where the privileged wrap service listens.
    #[serde(default = "default_service_socket")]
    pub service_socket: PathBuf,

    /// Directory holding the fixed profile filenames (`input.bin`,
    /// `input.mii`, ...).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_service_socket() -> PathBuf {
    "/run/apt/wrap.sock".into()
}
fn default_data_dir() -> PathBuf {
    ".".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build miicrypt configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise miicrypt configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.service_socket.as_os_str().is_empty() {
            anyhow::bail!("SERVICE_SOCKET must not be empty");
        }
        if self.data_dir.as_os_str().is_empty() {
            anyhow::bail!("DATA_DIR must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(default_service_socket(), PathBuf::from("/run/apt/wrap.sock"));
        assert_eq!(default_data_dir(), PathBuf::from("."));
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_rejects_empty_socket() {
        let cfg = Config {
            service_socket: PathBuf::new(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_data_dir() {
        let cfg = Config {
            service_socket: default_service_socket(),
            data_dir: PathBuf::new(),
            log_level: default_log_level(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        let cfg = Config {
            service_socket: default_service_socket(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        };
        assert!(cfg.validate().is_ok());
    }
}
