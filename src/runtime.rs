//! Runtime Lifecycle
//!
//! Wires the compiler adapters, loaders, and composite providers together and
//! owns their lifecycle: `start` brings up the watch loops when hot reload is
//! enabled, `shutdown` tears them down. Both are idempotent; `shutdown` is
//! the entry point for the host's shutdown hook.

use crate::config::ScriptsConfig;
use crate::definition::{AgentDefinition, FunctionDefinition};
use crate::error::LoaderError;
use crate::provider::{CompositeAgentProvider, CompositeFunctionProvider};
use crate::scripting::compiler::Compile;
use crate::scripting::loader::{AgentLoader, FunctionLoader};
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the two script loaders and exposes their composite providers.
pub struct ScriptRuntime {
    config: ScriptsConfig,
    agent_loader: Arc<AgentLoader>,
    function_loader: Arc<FunctionLoader>,
    agents: CompositeAgentProvider,
    functions: CompositeFunctionProvider,
}

impl ScriptRuntime {
    /// Assemble a runtime from its collaborators.
    ///
    /// `static_agents` and `static_functions` are fixed at construction and
    /// are overridden by dynamically loaded units with the same name.
    pub fn new(
        config: ScriptsConfig,
        agent_compiler: Arc<dyn Compile<AgentDefinition>>,
        function_compiler: Arc<dyn Compile<FunctionDefinition>>,
        static_agents: Vec<AgentDefinition>,
        static_functions: Vec<FunctionDefinition>,
    ) -> Self {
        let agent_loader = Arc::new(AgentLoader::agents(agent_compiler));
        let function_loader = Arc::new(FunctionLoader::functions(function_compiler));

        let agents =
            CompositeAgentProvider::new(vec![Arc::clone(&agent_loader)], static_agents);
        let functions =
            CompositeFunctionProvider::new(vec![Arc::clone(&function_loader)], static_functions);

        Self {
            config,
            agent_loader,
            function_loader,
            agents,
            functions,
        }
    }

    /// Seed the agent loader with a pre-compiled definition.
    pub fn seed_agent(&self, agent: AgentDefinition) {
        self.agent_loader.load_compiled(agent);
    }

    /// Seed the function loader with a pre-compiled definition.
    pub fn seed_function(&self, function: FunctionDefinition) {
        self.function_loader.load_compiled(function);
    }

    /// Start the watch loops if hot reload is enabled.
    ///
    /// A missing script folder is a fatal configuration error; the runtime
    /// refuses to start hot reload rather than watch nothing.
    pub fn start(&self) -> Result<(), LoaderError> {
        if !self.config.hot_reload {
            debug!("Hot reload disabled, script loaders serve seeded units only");
            return Ok(());
        }
        self.config.validate()?;

        let interval = self.config.poll_interval();
        self.agent_loader
            .start_hot_reload(&self.config.folder, interval)?;
        self.function_loader
            .start_hot_reload(&self.config.folder, interval)?;

        info!(folder = %self.config.folder.display(), "Script runtime started");
        Ok(())
    }

    /// Stop both watch loops and release the watchers. Idempotent.
    pub async fn shutdown(&self) {
        self.agent_loader.destroy().await;
        self.function_loader.destroy().await;
        info!("Script runtime shut down");
    }

    pub fn agents(&self) -> &CompositeAgentProvider {
        &self.agents
    }

    pub fn functions(&self) -> &CompositeFunctionProvider {
        &self.functions
    }

    pub fn agent_loader(&self) -> &Arc<AgentLoader> {
        &self.agent_loader
    }

    pub fn function_loader(&self) -> &Arc<FunctionLoader> {
        &self.function_loader
    }
}
