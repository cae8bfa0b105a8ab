//! Composite Unit Providers
//!
//! Merge statically registered units and dynamically loaded units into a
//! single lookup-by-name surface. Providers query loader snapshots live on
//! every call, so a reload is visible to the next lookup.
//!
//! Precedence is explicit: dynamically loaded units override static ones with
//! the same name, since scripts represent operator overrides of built-ins.
//! Among loaders, earlier loaders in the list win.

use crate::definition::{AgentDefinition, FunctionDefinition, Named};
use crate::error::ProviderError;
use crate::scripting::loader::ScriptLoader;
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup surface for agent definitions.
pub trait AgentProvider: Send + Sync {
    fn get_agent(&self, name: &str) -> Result<AgentDefinition, ProviderError>;
    fn agents(&self) -> Vec<AgentDefinition>;
}

/// Lookup surface for function definitions.
pub trait FunctionProvider: Send + Sync {
    fn get_function(&self, name: &str) -> Result<FunctionDefinition, ProviderError>;
    fn functions(&self) -> Vec<FunctionDefinition>;
}

/// Read-through union of static units and loader registries.
pub struct CompositeProvider<T> {
    loaders: Vec<Arc<ScriptLoader<T>>>,
    statics: Vec<T>,
}

/// Composite provider over agent definitions.
pub type CompositeAgentProvider = CompositeProvider<AgentDefinition>;

/// Composite provider over function definitions.
pub type CompositeFunctionProvider = CompositeProvider<FunctionDefinition>;

impl<T> CompositeProvider<T>
where
    T: Named + Clone + Send + Sync + 'static,
{
    pub fn new(loaders: Vec<Arc<ScriptLoader<T>>>, statics: Vec<T>) -> Self {
        Self { loaders, statics }
    }

    /// The union of all units, de-duplicated by name under the documented
    /// precedence, sorted by name.
    pub fn list(&self) -> Vec<T> {
        let mut by_name: HashMap<String, T> = HashMap::new();
        for unit in &self.statics {
            by_name.insert(unit.name().to_string(), unit.clone());
        }
        // Later inserts win, so iterate loaders lowest-precedence first.
        for loader in self.loaders.iter().rev() {
            for unit in loader.units() {
                by_name.insert(unit.name().to_string(), unit);
            }
        }

        let mut units: Vec<T> = by_name.into_values().collect();
        units.sort_by(|a, b| a.name().cmp(b.name()));
        units
    }

    /// The highest-precedence unit with the given name.
    pub fn get_by_name(&self, name: &str) -> Result<T, ProviderError> {
        for loader in &self.loaders {
            if let Some(unit) = loader.snapshot().values().find(|u| u.name() == name) {
                return Ok(unit.clone());
            }
        }
        self.statics
            .iter()
            .find(|u| u.name() == name)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }
}

impl AgentProvider for CompositeAgentProvider {
    fn get_agent(&self, name: &str) -> Result<AgentDefinition, ProviderError> {
        self.get_by_name(name)
    }

    fn agents(&self) -> Vec<AgentDefinition> {
        self.list()
    }
}

impl FunctionProvider for CompositeFunctionProvider {
    fn get_function(&self, name: &str) -> Result<FunctionDefinition, ProviderError> {
        self.get_by_name(name)
    }

    fn functions(&self) -> Vec<FunctionDefinition> {
        self.list()
    }
}
