//! Error taxonomy for the runtime extensibility core.
//!
//! Configuration problems are fatal at startup, compile problems are isolated
//! per script, and filter failures propagate to the pipeline caller.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while executing a message filter.
///
/// The pipeline never swallows these; `map_all`/`map_latest` return the first
/// failure to their caller and leave failure handling to the execution engine.
#[derive(Debug, Error)]
#[error("filter '{filter}' failed: {message}")]
pub struct FilterError {
    /// Name of the filter that failed.
    pub filter: String,
    /// Human-readable failure description.
    pub message: String,
}

impl FilterError {
    /// Create a new filter error.
    pub fn new(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the script loaders and their watch loop.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Fatal configuration problem detected before the watch loop starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// A directory scan failed mid-run. The cycle is skipped and the
    /// previously published registry stays authoritative.
    #[error("failed to scan script folder {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by unit providers and the capability resolver.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Lookup by name found no matching unit.
    #[error("no definition named '{0}'")]
    NotFound(String),

    /// The dependency-resolution hook has no factory for the requested key.
    #[error("no capability registered for '{0}'")]
    UnknownCapability(String),
}
