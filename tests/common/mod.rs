//! Shared test doubles for the integration suites.

use async_trait::async_trait;
use parley::definition::{AgentDefinition, FunctionDefinition};
use parley::scripting::{Compile, Diagnostic};

/// Compiles sources of the form `agent <name>`; anything else is a
/// diagnostic.
pub struct StubAgentCompiler;

#[async_trait]
impl Compile<AgentDefinition> for StubAgentCompiler {
    async fn compile(&self, source: &str) -> Result<AgentDefinition, Diagnostic> {
        match source.trim().strip_prefix("agent ") {
            Some(name) => Ok(AgentDefinition::new(name.trim(), "test prompt")),
            None => Err(Diagnostic::new("expected 'agent <name>'")),
        }
    }
}

/// Compiles sources of the form `function <name>`.
pub struct StubFunctionCompiler;

#[async_trait]
impl Compile<FunctionDefinition> for StubFunctionCompiler {
    async fn compile(&self, source: &str) -> Result<FunctionDefinition, Diagnostic> {
        match source.trim().strip_prefix("function ") {
            Some(name) => Ok(FunctionDefinition::new(name.trim(), "test function")),
            None => Err(Diagnostic::new("expected 'function <name>'")),
        }
    }
}
