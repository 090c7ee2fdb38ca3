//! Resource definitions: one CRD version described as data
//!
//! A definition file is YAML:
//!
//! ```yaml
//! schemaVersion: crdform/v1
//! apiVersion: cert-manager.io/v1
//! kind: Certificate
//! properties:
//!   secretName:
//!     type: string
//!     required: true
//! ```
//!
//! Files may hold several documents separated by `---`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::schema::{Attribute, AttributeType, Schema, to_snake_case};
use crate::validation::Format;

/// Supported definition format identifier
pub const SCHEMA_VERSION: &str = "crdform/v1";

/// Top-level manifest fields a payload may not shadow
const RESERVED_FIELDS: &[&str] = &["apiVersion", "kind", "metadata", "id", "yaml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Fixed `group/version` written to every manifest
    pub api_version: String,

    /// Fixed kind written to every manifest
    pub kind: String,

    /// Explicit resource type name, bypassing the derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Cluster-scoped kinds have no `metadata.namespace`
    #[serde(default = "default_true")]
    pub namespaced: bool,

    /// Name of the top-level payload block (`spec`, `configuration`, ...)
    #[serde(default = "default_payload")]
    pub payload: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub payload_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Payload attributes, keyed by manifest name
    #[serde(default)]
    pub properties: IndexMap<String, Attribute>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_payload() -> String {
    "spec".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ResourceDefinition {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            schema_version: default_schema_version(),
            api_version: api_version.into(),
            kind: kind.into(),
            type_name: None,
            namespaced: true,
            payload: default_payload(),
            payload_required: false,
            description: None,
            properties: IndexMap::new(),
        }
    }

    /// API group, `None` for the core group (`apiVersion: v1`)
    pub fn group(&self) -> Option<&str> {
        self.api_version.split_once('/').map(|(group, _)| group)
    }

    pub fn version(&self) -> &str {
        self.api_version
            .split_once('/')
            .map(|(_, version)| version)
            .unwrap_or(&self.api_version)
    }

    /// Resource type name, e.g. `k8s_cert_manager_io_certificate_v1`
    pub fn type_name(&self, prefix: &str) -> String {
        if let Some(name) = &self.type_name {
            return name.clone();
        }

        let mut parts = Vec::with_capacity(4);
        if !prefix.is_empty() {
            parts.push(prefix.to_string());
        }
        if let Some(group) = self.group() {
            parts.push(group.replace(['.', '-'], "_"));
        }
        parts.push(to_snake_case(&self.kind));
        parts.push(self.version().replace(['.', '-'], "_"));
        parts.join("_")
    }

    /// Check the definition for mistakes that would make its schema unusable
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| CoreError::InvalidDefinition {
            name: self.display_name(),
            message,
        };

        if self.schema_version != SCHEMA_VERSION {
            return Err(invalid(format!(
                "unsupported schemaVersion '{}', expected '{}'",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        if self.api_version.trim().is_empty() {
            return Err(invalid("apiVersion must not be empty".to_string()));
        }
        if self.group().is_some_and(str::is_empty) || self.version().is_empty() {
            return Err(invalid(format!(
                "apiVersion '{}' must be 'version' or 'group/version'",
                self.api_version
            )));
        }
        if self.kind.trim().is_empty() {
            return Err(invalid("kind must not be empty".to_string()));
        }
        if self.payload.is_empty() || RESERVED_FIELDS.contains(&self.payload.as_str()) {
            return Err(invalid(format!(
                "payload field '{}' collides with a reserved manifest field",
                self.payload
            )));
        }

        check_config_names(&self.payload, &self.properties).map_err(invalid)?;
        for (name, attr) in &self.properties {
            validate_attribute(&format!("{}.{}", self.payload, name), attr).map_err(invalid)?;
        }

        Ok(())
    }

    fn display_name(&self) -> String {
        format!("{}/{}", self.api_version, self.kind)
    }

    /// Full attribute schema: computed identity fields, metadata and payload
    pub fn schema(&self) -> Schema {
        let mut attributes = IndexMap::new();

        attributes.insert(
            "id".to_string(),
            Attribute::new(AttributeType::Integer)
                .computed()
                .with_description("Timestamp-based identifier of the rendered manifest"),
        );
        attributes.insert(
            "yaml".to_string(),
            Attribute::new(AttributeType::String)
                .computed()
                .with_description("Rendered Kubernetes manifest"),
        );
        attributes.insert(
            "apiVersion".to_string(),
            Attribute::new(AttributeType::String)
                .computed()
                .with_description(format!("Always '{}'", self.api_version)),
        );
        attributes.insert(
            "kind".to_string(),
            Attribute::new(AttributeType::String)
                .computed()
                .with_description(format!("Always '{}'", self.kind)),
        );
        attributes.insert("metadata".to_string(), self.metadata_attribute());

        let mut payload = Attribute::object(self.properties.clone());
        if let Some(desc) = &self.description {
            payload = payload.with_description(desc.clone());
        }
        if self.payload_required {
            payload = payload.required();
        }
        attributes.insert(self.payload.clone(), payload);

        Schema {
            description: self.description.clone(),
            attributes,
        }
    }

    fn metadata_attribute(&self) -> Attribute {
        let mut properties = IndexMap::new();
        properties.insert(
            "name".to_string(),
            Attribute::new(AttributeType::String)
                .required()
                .with_format(Format::K8sName)
                .with_description("Name of the object, unique within its namespace"),
        );
        if self.namespaced {
            properties.insert(
                "namespace".to_string(),
                Attribute::new(AttributeType::String)
                    .with_format(Format::DnsLabel)
                    .with_description("Namespace of the object"),
            );
        }
        properties.insert(
            "labels".to_string(),
            Attribute::new(AttributeType::Map).with_format(Format::Labels),
        );
        properties.insert(
            "annotations".to_string(),
            Attribute::new(AttributeType::Map).with_format(Format::Annotations),
        );

        Attribute::object(properties)
            .required()
            .with_description("Standard Kubernetes object metadata")
    }

    /// Parse every definition in a (multi-document) YAML string
    pub fn from_yaml(content: &str) -> Result<Vec<Self>> {
        let mut definitions = Vec::new();

        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            let definition: Self = serde_yaml::from_value(value)?;
            definition.validate()?;
            definitions.push(definition);
        }

        Ok(definitions)
    }

    /// Load every definition in a file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::DefinitionNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let definitions = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), count = definitions.len(), "loaded definitions");
        Ok(definitions)
    }

    /// Load every `*.yaml`/`*.yml` file below a directory, in path order
    ///
    /// A plain file path is loaded as a single file.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Self>> {
        let dir = dir.as_ref();
        if dir.is_file() {
            return Self::load_file(dir);
        }
        if !dir.is_dir() {
            return Err(CoreError::DefinitionNotFound {
                path: dir.display().to_string(),
            });
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if matches!(ext.as_str(), "yaml" | "yml") {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }
        files.sort();

        let mut definitions = Vec::new();
        for file in files {
            definitions.extend(Self::load_file(&file)?);
        }
        Ok(definitions)
    }
}

/// Sibling properties must map to distinct configuration names
fn check_config_names(
    path: &str,
    properties: &IndexMap<String, Attribute>,
) -> std::result::Result<(), String> {
    let mut seen: IndexMap<String, &str> = IndexMap::new();
    for (name, attr) in properties {
        let config_name = attr.config_name(name);
        if let Some(first) = seen.insert(config_name.clone(), name) {
            return Err(format!(
                "properties '{}.{}' and '{}.{}' share the configuration name '{}' (set 'attribute' on one of them)",
                path, first, path, name, config_name
            ));
        }
    }
    Ok(())
}

fn validate_attribute(path: &str, attr: &Attribute) -> std::result::Result<(), String> {
    match attr.attr_type {
        AttributeType::Object if attr.properties.is_empty() => {
            return Err(format!(
                "object attribute '{}' declares no properties (use type 'map' or 'dynamic')",
                path
            ));
        }
        AttributeType::List if attr.items.is_none() => {
            return Err(format!("list attribute '{}' declares no items", path));
        }
        _ => {}
    }

    if let Some(pattern) = &attr.pattern {
        regex::Regex::new(pattern)
            .map_err(|e| format!("attribute '{}' has an invalid pattern: {}", path, e))?;
    }

    if let Some(format) = attr.format {
        let expected = match format {
            Format::K8sName | Format::DnsLabel | Format::Base64 => AttributeType::String,
            Format::Labels | Format::Annotations => AttributeType::Map,
        };
        if attr.attr_type != expected {
            return Err(format!(
                "attribute '{}' uses format '{}' which requires type '{}', not '{}'",
                path, format, expected, attr.attr_type
            ));
        }
    }

    check_config_names(path, &attr.properties)?;
    for (name, child) in &attr.properties {
        validate_attribute(&format!("{}.{}", path, name), child)?;
    }
    if let Some(items) = &attr.items {
        validate_attribute(&format!("{}[]", path), items)?;
    }

    Ok(())
}
