//! Resource configuration with deep merge support

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dynamic::DynamicValue;
use crate::error::{CoreError, Result};

/// User configuration for one resource, keyed by configuration attribute names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceConfig(pub DynamicValue);

impl Default for ResourceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self(DynamicValue::empty_map())
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    ///
    /// An empty document is an empty configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        match DynamicValue::from_yaml(yaml)? {
            DynamicValue::Null => Ok(Self::new()),
            value @ DynamicValue::Map(_) => Ok(Self(value)),
            other => Err(CoreError::ConfigMerge {
                message: format!(
                    "configuration must be a mapping of attributes, got {}",
                    other.type_name()
                ),
            }),
        }
    }

    /// Deep merge another configuration into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Lists: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &ResourceConfig) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value by dotted path (e.g., "spec.secret_name")
    pub fn set(&mut self, path: &str, value: DynamicValue) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(CoreError::ConfigMerge {
                message: format!("Invalid attribute path '{}'", path),
            });
        }
        set_nested(&mut self.0, &parts, value);
        Ok(())
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&DynamicValue> {
        self.0.get_path(path)
    }

    pub fn inner(&self) -> &DynamicValue {
        &self.0
    }

    pub fn into_inner(self) -> DynamicValue {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            DynamicValue::Map(map) => map.is_empty(),
            DynamicValue::Null => true,
            _ => false,
        }
    }
}

fn deep_merge(base: &mut DynamicValue, overlay: &DynamicValue) {
    match (base, overlay) {
        (DynamicValue::Map(base_map), DynamicValue::Map(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

fn set_nested(value: &mut DynamicValue, path: &[&str], new_value: DynamicValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if value.as_map().is_none() {
        *value = DynamicValue::empty_map();
    }

    if let Some(map) = value.as_map_mut() {
        let entry = map
            .entry((*key).to_string())
            .or_insert_with(DynamicValue::empty_map);
        set_nested(entry, remaining, new_value);
    }
}

/// Parse --set arguments (key=value format)
///
/// A value wrapped in double quotes is always a string, so `port="8080"`
/// yields the string form of an int-or-string attribute.
pub fn parse_set_values(set_args: &[String]) -> Result<ResourceConfig> {
    let mut config = ResourceConfig::new();

    for arg in set_args {
        let (key, val) = arg.split_once('=').ok_or_else(|| CoreError::ConfigMerge {
            message: format!("Invalid --set format: '{}'. Expected key=value", arg),
        })?;

        config.set(key, parse_set_value(val))?;
    }

    Ok(config)
}

fn parse_set_value(val: &str) -> DynamicValue {
    if let Some(quoted) = val
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return DynamicValue::String(quoted.to_string());
    }

    if val == "true" {
        DynamicValue::Bool(true)
    } else if val == "false" {
        DynamicValue::Bool(false)
    } else if val == "null" {
        DynamicValue::Null
    } else if let Ok(num) = val.parse::<i64>() {
        DynamicValue::Int(num)
    } else if let Some(num) = val.parse::<f64>().ok().filter(|n| n.is_finite()) {
        DynamicValue::Float(num)
    } else if val.starts_with('[') || val.starts_with('{') {
        serde_json::from_str(val).unwrap_or_else(|_| DynamicValue::String(val.to_string()))
    } else {
        DynamicValue::String(val.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_merge() {
        let mut base = ResourceConfig::from_yaml(
            r#"
metadata:
  name: web
  labels:
    app: web
spec:
  dns_names: [a.example.com, b.example.com]
"#,
        )
        .unwrap();

        let overlay = ResourceConfig::from_yaml(
            r#"
metadata:
  namespace: prod
  labels:
    tier: frontend
spec:
  dns_names: [c.example.com]
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("metadata.name").unwrap(), &DynamicValue::from("web"));
        assert_eq!(base.get("metadata.namespace").unwrap(), &DynamicValue::from("prod"));
        assert!(base.get("metadata.labels.app").is_some());
        assert!(base.get("metadata.labels.tier").is_some());
        assert_eq!(base.get("spec.dns_names").unwrap().as_seq().unwrap().len(), 1);
    }

    #[test]
    fn test_set_nested() {
        let mut config = ResourceConfig::new();
        config.set("spec.issuer_ref.name", "letsencrypt".into()).unwrap();
        config.set("metadata.name", "web".into()).unwrap();

        assert_eq!(
            config.get("spec.issuer_ref.name").and_then(DynamicValue::as_str),
            Some("letsencrypt")
        );
        assert!(config.set("spec..name", DynamicValue::Null).is_err());
    }

    #[test]
    fn test_empty_document() {
        assert!(ResourceConfig::from_yaml("").unwrap().is_empty());
        assert!(ResourceConfig::from_yaml("- not a map").is_err());
    }

    #[test]
    fn test_parse_set_values() {
        let args = vec![
            "spec.secret_name=web-tls".to_string(),
            "spec.port=8080".to_string(),
            "spec.target_port=\"8080\"".to_string(),
            "spec.enabled=true".to_string(),
            "spec.dns_names=[\"a.example.com\"]".to_string(),
        ];

        let config = parse_set_values(&args).unwrap();

        assert_eq!(config.get("spec.secret_name").unwrap(), &DynamicValue::from("web-tls"));
        assert_eq!(config.get("spec.port").unwrap(), &DynamicValue::Int(8080));
        assert_eq!(config.get("spec.target_port").unwrap(), &DynamicValue::from("8080"));
        assert_eq!(config.get("spec.enabled").unwrap(), &DynamicValue::Bool(true));
        assert_eq!(config.get("spec.dns_names").unwrap().as_seq().unwrap().len(), 1);
    }

    #[test]
    fn test_non_finite_numbers_stay_strings() {
        let args = vec![
            "spec.a=nan".to_string(),
            "spec.b=inf".to_string(),
            "spec.c=-infinity".to_string(),
            "spec.d=1.5".to_string(),
        ];
        let config = parse_set_values(&args).unwrap();

        assert_eq!(config.get("spec.a").unwrap(), &DynamicValue::from("nan"));
        assert_eq!(config.get("spec.b").unwrap(), &DynamicValue::from("inf"));
        assert_eq!(config.get("spec.c").unwrap(), &DynamicValue::from("-infinity"));
        assert_eq!(config.get("spec.d").unwrap(), &DynamicValue::Float(1.5));
    }

    #[test]
    fn test_parse_set_values_rejects_missing_equals() {
        let err = parse_set_values(&["spec.port".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Expected key=value"));
    }
}
