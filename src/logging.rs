//! Logging System
//!
//! Structured logging via the `tracing` crate. The host may install its own
//! subscriber instead; `init` is best-effort and leaves an already-installed
//! subscriber in place.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Filter directives, e.g. `info,parley=debug`. Falls back to the
    /// `PARLEY_LOG` environment variable, then `info`.
    pub filter: Option<String>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Also write to this file (appended).
    pub file: Option<PathBuf>,
}

/// Resolve the default log file path under the platform state directory.
pub fn default_log_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "parley", "parley")
        .and_then(|dirs| dirs.state_dir().map(|dir| dir.join("parley.log")))
}

/// Install the global tracing subscriber.
pub fn init(config: &LoggingConfig) {
    let env_filter = match &config.filter {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_env("PARLEY_LOG").ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));

    let file_layer = config.file.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()?;
        Some(
            fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
    });

    let registry = Registry::default().with(env_filter).with(file_layer);
    if config.json {
        let _ = registry
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
            .try_init();
    } else {
        let _ = registry
            .with(fmt::layer().with_timer(ChronoUtc::rfc_3339()))
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }

    #[test]
    fn test_file_layer_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("parley.log");
        init(&LoggingConfig {
            filter: Some("warn".to_string()),
            json: false,
            file: Some(path.clone()),
        });
        assert!(path.parent().unwrap().is_dir());
    }
}
