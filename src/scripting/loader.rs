//! Script Loaders
//!
//! Each loader owns one registry of compiled units and an optional watch loop
//! that re-scans the script folder on a timer. Reconciliation builds a fully
//! populated replacement registry and installs it with a single reference
//! swap, so concurrent readers see either the old set or the new set, never a
//! mix.

use crate::definition::{AgentDefinition, FunctionDefinition, Named};
use crate::error::LoaderError;
use crate::scripting::compiler::{Compile, Diagnostic};
use crate::scripting::source::{
    Changeset, ScriptScanner, AGENT_SCRIPT_SUFFIX, FUNCTION_SCRIPT_SUFFIX,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Loader producing agent definitions.
pub type AgentLoader = ScriptLoader<AgentDefinition>;

/// Loader producing function definitions.
pub type FunctionLoader = ScriptLoader<FunctionDefinition>;

/// Registry state shared between the watch loop and concurrent readers.
struct LoaderState<T> {
    kind: &'static str,
    compiler: Arc<dyn Compile<T>>,
    /// Pre-compiled units supplied at startup. No backing file, never evicted.
    seeded: RwLock<HashMap<String, T>>,
    /// Latest good artifact per script identity.
    scripted: RwLock<HashMap<String, T>>,
    /// The snapshot readers see. Replaced wholesale, never edited.
    published: RwLock<Arc<HashMap<String, T>>>,
    /// Last compile diagnostic per script identity.
    diagnostics: RwLock<HashMap<String, Diagnostic>>,
}

impl<T> LoaderState<T>
where
    T: Named + Clone + Send + Sync + 'static,
{
    /// Build the merged seeded + scripted view and install it atomically.
    ///
    /// A scripted unit sharing an identity with a seeded one shadows it until
    /// its backing file disappears.
    fn publish(&self) {
        let merged = {
            let seeded = self.seeded.read();
            let scripted = self.scripted.read();
            let mut merged = seeded.clone();
            merged.extend(scripted.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        };
        *self.published.write() = Arc::new(merged);
    }

    async fn reconcile(&self, changeset: Changeset) {
        if changeset.is_empty() {
            return;
        }
        info!(
            kind = self.kind,
            added = changeset.added.len(),
            changed = changeset.changed.len(),
            removed = changeset.removed.len(),
            "Reconciling script changes"
        );

        // Work on an owned copy; no lock is held across compiler awaits.
        let mut next = self.scripted.read().clone();

        for unit in changeset.added.into_iter().chain(changeset.changed) {
            match self.compiler.compile(&unit.source).await {
                Ok(artifact) => {
                    debug!(kind = self.kind, unit = %unit.name, "Compiled script");
                    next.insert(unit.name.clone(), artifact);
                    self.diagnostics.write().remove(&unit.name);
                }
                Err(diagnostic) => {
                    warn!(
                        kind = self.kind,
                        unit = %unit.name,
                        diagnostic = %diagnostic,
                        "Script failed to compile, previous unit stays active"
                    );
                    self.diagnostics.write().insert(unit.name.clone(), diagnostic);
                }
            }
        }

        for name in &changeset.removed {
            next.remove(name);
            self.diagnostics.write().remove(name);
        }

        *self.scripted.write() = next;
        self.publish();
    }
}

/// Compiles discovered scripts, caches units by identity, and republishes the
/// active set atomically on change.
pub struct ScriptLoader<T> {
    state: Arc<LoaderState<T>>,
    suffixes: Vec<String>,
    running: Arc<RwLock<bool>>,
    stop_signal: Arc<Notify>,
    watch: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<T> ScriptLoader<T>
where
    T: Named + Clone + Send + Sync + 'static,
{
    /// Create a loader of the given kind.
    ///
    /// `kind` labels log lines; `suffixes` select which files in the script
    /// folder belong to this loader.
    pub fn new(kind: &'static str, suffixes: &[&str], compiler: Arc<dyn Compile<T>>) -> Self {
        Self {
            state: Arc::new(LoaderState {
                kind,
                compiler,
                seeded: RwLock::new(HashMap::new()),
                scripted: RwLock::new(HashMap::new()),
                published: RwLock::new(Arc::new(HashMap::new())),
                diagnostics: RwLock::new(HashMap::new()),
            }),
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            running: Arc::new(RwLock::new(false)),
            stop_signal: Arc::new(Notify::new()),
            watch: Mutex::new(None),
        }
    }

    /// Seed the registry with a pre-compiled unit, bypassing the compiler.
    ///
    /// Seeded units have no backing file and are never evicted by the watch
    /// loop.
    pub fn load_compiled(&self, unit: T) {
        let name = unit.name().to_string();
        self.state.seeded.write().insert(name.clone(), unit);
        self.state.publish();
        debug!(kind = self.state.kind, unit = %name, "Seeded pre-compiled unit");
    }

    /// Apply one changeset: compile added/changed units, evict removed ones,
    /// and publish the resulting snapshot.
    pub async fn reconcile(&self, changeset: Changeset) {
        self.state.reconcile(changeset).await;
    }

    /// Begin watching `dir` for script changes every `interval`.
    ///
    /// Idempotent: calling this while a watch loop runs is a no-op. Fails if
    /// the directory does not exist.
    pub fn start_hot_reload(&self, dir: &Path, interval: Duration) -> Result<(), LoaderError> {
        if !dir.is_dir() {
            return Err(LoaderError::Config(format!(
                "script folder does not exist: {}",
                dir.display()
            )));
        }

        {
            let mut running = self.running.write();
            if *running {
                debug!(kind = self.state.kind, "Hot reload already running");
                return Ok(());
            }
            *running = true;
        }

        let suffixes: Vec<&str> = self.suffixes.iter().map(String::as_str).collect();
        let scanner = ScriptScanner::new(dir, &suffixes);
        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let stop_signal = Arc::clone(&self.stop_signal);

        let handle = tokio::spawn(async move {
            Self::watch_loop(state, scanner, interval, running, stop_signal).await;
        });
        *self.watch.lock() = Some(handle);

        info!(
            kind = self.state.kind,
            folder = %dir.display(),
            interval_secs = interval.as_secs(),
            "Started script hot reload"
        );
        Ok(())
    }

    /// Stop the watch loop and wait for it to finish.
    ///
    /// Safe to call when hot reload was never started; idempotent. A cycle
    /// already in flight completes before the loop exits, so no partially
    /// built snapshot is ever published.
    pub async fn stop(&self) {
        {
            let mut running = self.running.write();
            if !*running {
                return;
            }
            *running = false;
        }
        self.stop_signal.notify_one();

        let handle = self.watch.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!(kind = self.state.kind, "Stopped script hot reload");
    }

    /// Teardown entry point for the host's shutdown sequence.
    pub async fn destroy(&self) {
        self.stop().await;
    }

    /// Whether the watch loop is currently running.
    pub fn is_watching(&self) -> bool {
        *self.running.read()
    }

    /// The currently published registry snapshot.
    ///
    /// The returned map is immutable; a later reload replaces the loader's
    /// snapshot but never this one.
    pub fn snapshot(&self) -> Arc<HashMap<String, T>> {
        Arc::clone(&self.state.published.read())
    }

    /// All currently published units.
    pub fn units(&self) -> Vec<T> {
        self.snapshot().values().cloned().collect()
    }

    /// Last compile diagnostic per script identity.
    pub fn diagnostics(&self) -> HashMap<String, Diagnostic> {
        self.state.diagnostics.read().clone()
    }

    async fn watch_loop(
        state: Arc<LoaderState<T>>,
        mut scanner: ScriptScanner,
        period: Duration,
        running: Arc<RwLock<bool>>,
        stop_signal: Arc<Notify>,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        debug!(kind = state.kind, "Watch loop started");

        loop {
            tokio::select! {
                _ = stop_signal.notified() => break,
                _ = interval.tick() => {
                    if !*running.read() {
                        break;
                    }
                    match scanner.scan() {
                        Ok(changeset) => state.reconcile(changeset).await,
                        Err(e) => {
                            warn!(kind = state.kind, error = %e, "Scan failed, cycle skipped");
                        }
                    }
                }
            }
        }

        debug!(kind = state.kind, "Watch loop stopped");
    }
}

impl AgentLoader {
    /// Loader for `*.agent.kts` scripts.
    pub fn agents(compiler: Arc<dyn Compile<AgentDefinition>>) -> Self {
        Self::new("agents", &[AGENT_SCRIPT_SUFFIX], compiler)
    }
}

impl FunctionLoader {
    /// Loader for `*.functions.kts` scripts.
    pub fn functions(compiler: Arc<dyn Compile<FunctionDefinition>>) -> Self {
        Self::new("functions", &[FUNCTION_SCRIPT_SUFFIX], compiler)
    }
}
