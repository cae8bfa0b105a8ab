//! Executable Unit Definitions
//!
//! The artifacts produced by the script compilers: agent definitions and
//! function definitions. Both are plain value types; how an agent decides
//! what to generate is the execution engine's concern, not ours.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything with a stable lookup name.
pub trait Named {
    fn name(&self) -> &str;
}

/// A compiled agent definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Prompt the execution engine supplies on every invocation.
    pub system_prompt: String,
    /// Preferred model, if the script pins one.
    #[serde(default)]
    pub model: Option<String>,
    /// Names of functions this agent may call.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            system_prompt: system_prompt.into(),
            model: None,
            tools: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

impl Named for AgentDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A compiled function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Optional grouping label, e.g. the feature area the function belongs to.
    #[serde(default)]
    pub group: Option<String>,
    /// JSON schema of the function's parameters.
    #[serde(default = "empty_schema")]
    pub parameters: serde_json::Value,
}

fn empty_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl FunctionDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            group: None,
            parameters: empty_schema(),
        }
    }
}

impl Named for FunctionDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}
