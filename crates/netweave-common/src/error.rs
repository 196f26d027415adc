//! Unified error types for the netweave workspace.
//!
//! Every fallible operation in the workspace reports one of these variants.
//! Validation and parse failures are detected before any host side effect;
//! capability failures carry the attempted step so a partially-built
//! topology can be diagnosed and torn down.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum NetweaveError {
    /// The topology description has bad references or duplicate names.
    #[error("invalid topology: {message}")]
    Validation {
        /// Description naming the offending entity.
        message: String,
    },

    /// A human-readable shaping string could not be parsed.
    #[error("cannot parse {field}: {message}")]
    Parse {
        /// Which shaping field was malformed.
        field: &'static str,
        /// Description naming the offending token.
        message: String,
    },

    /// An underlying host create/destroy/query call failed.
    #[error("{step}: {reason}")]
    Capability {
        /// The step that was being attempted.
        step: String,
        /// Failure text reported by the host operation.
        reason: String,
    },

    /// An internal invariant was violated, e.g. applying an unparsed
    /// link spec. Never caused by user input.
    #[error("internal state error: {message}")]
    InternalState {
        /// Description of the violated invariant.
        message: String,
    },

    /// An I/O operation failed during a host inventory scan.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, NetweaveError>;
