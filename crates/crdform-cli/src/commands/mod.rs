//! CLI commands

pub mod apply;
pub mod destroy;
pub mod import_crd;
pub mod refresh;
pub mod render;
pub mod resources;
pub mod schema;
pub mod validate;

use crdform_core::{DynamicValue, ResourceConfig, parse_set_values};
use std::path::PathBuf;

use crate::error::{CliError, Result};

/// Merge configuration files in order, then apply `--set` overrides
pub(crate) fn load_resource_config(files: &[PathBuf], set_values: &[String]) -> Result<DynamicValue> {
    let mut config = ResourceConfig::new();

    for file in files {
        let overlay = ResourceConfig::from_file(file).map_err(|e| match CliError::from(e) {
            CliError::Io { message } => CliError::Io {
                message: format!("{}: {}", file.display(), message),
            },
            other => other,
        })?;
        config.merge(&overlay);
        tracing::debug!(file = %file.display(), "merged configuration file");
    }

    if !set_values.is_empty() {
        config.merge(&parse_set_values(set_values)?);
        tracing::debug!(count = set_values.len(), "applied --set values");
    }

    Ok(config.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_then_set() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.yaml");
        let prod = dir.path().join("prod.yaml");
        std::fs::write(&base, "metadata:\n  name: web\n  namespace: dev\n").unwrap();
        std::fs::write(&prod, "metadata:\n  namespace: prod\n").unwrap();

        let config = load_resource_config(
            &[base, prod],
            &["spec.secret_name=web-tls".to_string()],
        )
        .unwrap();

        assert_eq!(config.get_path("metadata.name").and_then(DynamicValue::as_str), Some("web"));
        assert_eq!(
            config.get_path("metadata.namespace").and_then(DynamicValue::as_str),
            Some("prod")
        );
        assert_eq!(
            config.get_path("spec.secret_name").and_then(DynamicValue::as_str),
            Some("web-tls")
        );
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_resource_config(&[PathBuf::from("/nonexistent/config.yaml")], &[]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.yaml"));
    }
}
