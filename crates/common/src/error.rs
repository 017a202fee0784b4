//! Common error types shared across crates.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single round-trip to the wrap service.
///
/// The operator-facing line stays a bare "call failed"; the variants below
/// exist so the debug log can say why.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The channel to the service could not be used at all.
    #[error("channel I/O failed: {0}")]
    Channel(#[from] io::Error),

    /// The service answered with a non-success status word.
    #[error("service returned status {0:#010x}")]
    Status(u32),

    /// The service reported success but sent fewer bytes than the declared
    /// output size.
    #[error("reply shorter than the declared output size")]
    TruncatedReply,
}

/// Top-level error taxonomy for one triggered pipeline.
///
/// Every variant maps to the numeric code the tool logs alongside the
/// printed message:
/// - [`MiiError::Service`] → 1
/// - [`MiiError::SizeMismatch`] → 2
/// - [`MiiError::Io`] → 126
/// - [`MiiError::Allocation`] → 127
#[derive(Debug, Error)]
pub enum MiiError {
    /// A file could not be opened, read, or written.
    #[error("couldn't access {}: {source}", .path.display())]
    Io {
        /// Path of the file the operation failed on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A file's length differs from the fixed length its role requires.
    #[error("{} doesn't have the expected size (want {expected} bytes, got {actual})", .path.display())]
    SizeMismatch {
        /// Path of the offending file.
        path: PathBuf,
        /// Length the file's role requires.
        expected: usize,
        /// Length actually read.
        actual: usize,
    },

    /// The wrap service call failed or returned a non-success status.
    #[error("wrap service call failed: {0}")]
    Service(#[from] ServiceError),

    /// A working buffer could not be allocated.
    #[error("memory allocation failed")]
    Allocation,
}

impl MiiError {
    /// Numeric code logged for this error.
    ///
    /// The codes are never returned to a caller — the tool runs an
    /// interactive loop — but they are kept stable for the log line.
    pub fn exit_code(&self) -> u8 {
        match self {
            MiiError::Service(_) => 1,
            MiiError::SizeMismatch { .. } => 2,
            MiiError::Io { .. } => 126,
            MiiError::Allocation => 127,
        }
    }
}
