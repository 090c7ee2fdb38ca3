//! Local state store
//!
//! A JSON object mapping `<type>.<name>` to the type and the state the last
//! successful Create or Update produced.

use crdform_engine::ResourceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub state: ResourceState,
}

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    entries: BTreeMap<String, StateEntry>,
}

impl StateStore {
    /// Open the store; a missing file is an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CliError::other(format!("corrupt state file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "loaded state");
        Ok(Self { path, entries })
    }

    pub fn key(resource_type: &str, name: &str) -> String {
        format!("{resource_type}.{name}")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&StateEntry> {
        self.entries.get(&Self::key(resource_type, name))
    }

    pub fn insert(&mut self, name: &str, entry: StateEntry) {
        let key = Self::key(&entry.resource_type, name);
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, resource_type: &str, name: &str) -> Option<StateEntry> {
        self.entries.remove(&Self::key(resource_type, name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write the store atomically (temp file in the same directory, then rename)
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CliError::other(format!("failed to encode state: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, content + "\n")?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), entries = self.len(), "saved state");
        Ok(())
    }
}
