//! Unit Compiler Adapter
//!
//! Boundary to the script-compilation toolchain. The toolchain itself is a
//! black box: source text in, executable unit or diagnostic out. One adapter
//! instance is constructed by the host and passed to each loader explicitly;
//! there is no process-wide engine state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compile failure, human-readable, with a source location when available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} at {}:{}", self.message, line, column)
            }
            (Some(line), None) => write!(f, "{} at line {}", self.message, line),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Compiles script source into an artifact of type `T`.
///
/// The compile step may suspend; loaders await it off the request path.
#[async_trait]
pub trait Compile<T>: Send + Sync {
    async fn compile(&self, source: &str) -> Result<T, Diagnostic>;
}
