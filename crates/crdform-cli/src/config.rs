//! Provider configuration file (`crdform.yaml`)

use crdform_engine::{DEFAULT_PREFIX, Provider};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

pub const CONFIG_API_VERSION: &str = "crdform.io/v1";
pub const CONFIG_FILE_NAME: &str = "crdform.yaml";
pub const DEFAULT_STATE_FILE: &str = "crdform.state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Prefix of every resource type name
    #[serde(default = "default_prefix")]
    pub provider_prefix: String,

    /// Serve the definitions compiled into the binary
    #[serde(default = "default_true")]
    pub builtin_definitions: bool,

    /// Definition files or directories; relative entries resolve against
    /// the directory of the config file
    #[serde(default)]
    pub definitions: Vec<PathBuf>,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_api_version() -> String {
    CONFIG_API_VERSION.to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            provider_prefix: default_prefix(),
            builtin_definitions: true,
            definitions: Vec::new(),
            state_file: default_state_file(),
        }
    }
}

/// Flags that take precedence over the file
#[derive(Debug, Default)]
pub struct Overrides {
    pub definitions: Vec<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub no_builtin: bool,
}

impl ProviderConfig {
    /// Resolve the config file and load it
    ///
    /// An explicit path must exist. Otherwise `./crdform.yaml`, then the
    /// user config dir are tried, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = std::iter::once(PathBuf::from(CONFIG_FILE_NAME))
            .chain(dirs::config_dir().map(|dir| dir.join("crdform").join(CONFIG_FILE_NAME)));
        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        let mut config = Self::from_yaml(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for entry in &mut config.definitions {
            if entry.is_relative() {
                *entry = base.join(&*entry);
            }
        }

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| CliError::validation(format!("invalid config file: {e}")))?;

        if config.api_version != CONFIG_API_VERSION {
            return Err(CliError::Validation {
                message: format!("unsupported config apiVersion '{}'", config.api_version),
                help: Some(format!("set apiVersion: {CONFIG_API_VERSION}")),
            });
        }
        if config.provider_prefix.is_empty() {
            return Err(CliError::validation("providerPrefix must not be empty"));
        }
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if !overrides.definitions.is_empty() {
            self.definitions = overrides.definitions;
        }
        if let Some(state_file) = overrides.state_file {
            self.state_file = state_file;
        }
        if overrides.no_builtin {
            self.builtin_definitions = false;
        }
    }

    pub fn build_provider(&self) -> Result<Provider> {
        let mut builder = Provider::builder()
            .prefix(&self.provider_prefix)
            .builtin(self.builtin_definitions);
        for path in &self.definitions {
            builder = builder.definitions_dir(path);
        }
        let provider = builder.build()?;
        tracing::debug!(types = provider.len(), "provider ready");
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_yaml("").unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.provider_prefix, "k8s");
        assert!(config.builtin_definitions);
        assert_eq!(config.state_file, PathBuf::from("crdform.state.json"));
    }

    #[test]
    fn test_parse() {
        let config = ProviderConfig::from_yaml(
            "apiVersion: crdform.io/v1\nproviderPrefix: kube\nbuiltinDefinitions: false\ndefinitions:\n  - defs\nstateFile: out/state.json\n",
        )
        .unwrap();
        assert_eq!(config.provider_prefix, "kube");
        assert!(!config.builtin_definitions);
        assert_eq!(config.definitions, vec![PathBuf::from("defs")]);
        assert_eq!(config.state_file, PathBuf::from("out/state.json"));
    }

    #[test]
    fn test_wrong_api_version() {
        let err = ProviderConfig::from_yaml("apiVersion: crdform.io/v9\n").unwrap_err();
        assert!(err.to_string().contains("crdform.io/v9"));
    }

    #[test]
    fn test_missing_fields_default() {
        let config = ProviderConfig::from_yaml("apiVersion: crdform.io/v1\n").unwrap();
        assert!(config.definitions.is_empty());
    }

    #[test]
    fn test_relative_definitions_resolve_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crdform.yaml");
        std::fs::write(&path, "definitions:\n  - defs\n  - /abs/defs\n").unwrap();

        let config = ProviderConfig::from_file(&path).unwrap();
        assert_eq!(
            config.definitions,
            vec![dir.path().join("defs"), PathBuf::from("/abs/defs")]
        );
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ProviderConfig::load(Some(Path::new("/nonexistent/crdform.yaml"))).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut config = ProviderConfig::from_yaml("definitions:\n  - a\n").unwrap();
        config.apply(Overrides {
            definitions: vec![PathBuf::from("b")],
            state_file: Some(PathBuf::from("s.json")),
            no_builtin: true,
        });
        assert_eq!(config.definitions, vec![PathBuf::from("b")]);
        assert_eq!(config.state_file, PathBuf::from("s.json"));
        assert!(!config.builtin_definitions);
    }

    #[test]
    fn test_build_provider() {
        let mut config = ProviderConfig::default();
        config.provider_prefix = "kube".to_string();
        let provider = config.build_provider().unwrap();
        assert!(provider
            .type_names()
            .contains(&"kube_cert_manager_io_certificate_v1"));
    }
}
