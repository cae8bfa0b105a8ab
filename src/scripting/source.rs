//! Script Source Scanner
//!
//! Re-scans a configured directory on demand, producing the changeset of
//! script files added, changed, or removed since the previous scan. The
//! scanner holds no state shared with readers; it is driven by the loader's
//! watch loop, off the request hot path.

use crate::error::LoaderError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;
use walkdir::WalkDir;

/// Default suffix for agent scripts.
pub const AGENT_SCRIPT_SUFFIX: &str = "agent.kts";

/// Default suffix for function scripts.
pub const FUNCTION_SCRIPT_SUFFIX: &str = "functions.kts";

/// One discovered script file.
///
/// Identity derives from the file name with the script suffix stripped and is
/// stable across reloads as long as the path is unchanged.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub name: String,
    pub path: PathBuf,
    pub source: String,
    pub modified: SystemTime,
}

/// Files added, changed, and removed relative to the previous scan.
#[derive(Debug, Default)]
pub struct Changeset {
    pub added: Vec<SourceUnit>,
    pub changed: Vec<SourceUnit>,
    pub removed: Vec<String>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Stateful directory scanner.
///
/// Each call to [`ScriptScanner::scan`] walks the directory and diffs the
/// result against what the previous successful scan saw. A failed scan leaves
/// the recorded view untouched, so the next successful scan reports the full
/// delta.
pub struct ScriptScanner {
    dir: PathBuf,
    suffixes: Vec<String>,
    seen: HashMap<String, SystemTime>,
}

impl ScriptScanner {
    /// Create a scanner over `dir` recognizing files ending in any of
    /// `suffixes` (matched against the file name, after a dot).
    pub fn new(dir: impl Into<PathBuf>, suffixes: &[&str]) -> Self {
        Self {
            dir: dir.into(),
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            seen: HashMap::new(),
        }
    }

    /// Derive the unit identity from a file name, if it carries one of the
    /// recognized suffixes.
    fn unit_name(&self, file_name: &str) -> Option<String> {
        for suffix in &self.suffixes {
            let dotted = format!(".{suffix}");
            if let Some(stem) = file_name.strip_suffix(dotted.as_str()) {
                if !stem.is_empty() {
                    return Some(stem.to_string());
                }
            }
        }
        None
    }

    /// Walk the directory and return the changeset since the previous scan.
    ///
    /// Any I/O failure aborts the whole scan; the caller skips this cycle and
    /// retries on the next poll.
    pub fn scan(&mut self) -> Result<Changeset, LoaderError> {
        let current = self.collect()?;

        let mut changeset = Changeset::default();
        for (name, unit) in &current {
            match self.seen.get(name) {
                None => changeset.added.push(unit.clone()),
                Some(previous) if *previous != unit.modified => {
                    changeset.changed.push(unit.clone())
                }
                Some(_) => {}
            }
        }
        for name in self.seen.keys() {
            if !current.contains_key(name) {
                changeset.removed.push(name.clone());
            }
        }
        changeset.removed.sort();

        self.seen = current
            .into_iter()
            .map(|(name, unit)| (name, unit.modified))
            .collect();

        Ok(changeset)
    }

    fn collect(&self) -> Result<HashMap<String, SourceUnit>, LoaderError> {
        let scan_error = |source: std::io::Error| LoaderError::Scan {
            path: self.dir.clone(),
            source,
        };

        if !self.dir.is_dir() {
            return Err(scan_error(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("script folder does not exist: {}", self.dir.display()),
            )));
        }

        let mut units = HashMap::new();
        let mut entries: Vec<_> = WalkDir::new(&self.dir)
            .follow_links(false)
            .into_iter()
            .collect::<Result<_, _>>()
            .map_err(|e| scan_error(e.into()))?;
        entries.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in entries {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(name) = self.unit_name(file_name) else {
                continue;
            };

            let metadata = entry.metadata().map_err(|e| scan_error(e.into()))?;
            let modified = metadata.modified().map_err(scan_error)?;
            let source = std::fs::read_to_string(entry.path()).map_err(scan_error)?;

            if units
                .insert(
                    name.clone(),
                    SourceUnit {
                        name: name.clone(),
                        path: entry.path().to_path_buf(),
                        source,
                        modified,
                    },
                )
                .is_some()
            {
                warn!(unit = %name, path = %entry.path().display(), "duplicate script identity, later file wins");
            }
        }

        Ok(units)
    }

    /// The directory this scanner watches.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
