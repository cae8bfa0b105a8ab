//! Script Loading
//!
//! Compiles externally authored script files into executable unit definitions
//! and republishes the active set atomically on change. A broken script never
//! takes down already-working units.

pub mod compiler;
pub mod loader;
pub mod source;

pub use compiler::{Compile, Diagnostic};
pub use loader::{AgentLoader, FunctionLoader, ScriptLoader};
pub use source::{Changeset, ScriptScanner, SourceUnit, AGENT_SCRIPT_SUFFIX, FUNCTION_SCRIPT_SUFFIX};
