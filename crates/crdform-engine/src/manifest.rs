//! Kubernetes manifest model
//!
//! A [`Manifest`] is what a resource renders: `apiVersion`, `kind`,
//! `metadata` and one payload block. Every optional field is omitted when it
//! is absent, null or an empty collection.

use crdform_core::schema::to_snake_case;
use crdform_core::{Attribute, AttributeType, DynamicValue, IntOrString, ResourceDefinition};
use indexmap::IndexMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::error::{EngineError, Result};

/// Configuration side of `metadata`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl MetadataConfig {
    /// Decode the `metadata` attribute of a configuration tree
    pub fn from_config(value: &DynamicValue) -> Result<Self> {
        let mut metadata: Self = serde_json::from_value(value.without_nulls().to_json())
            .map_err(|e| EngineError::decode("metadata", e.to_string()))?;

        // Empty maps carry no information and would render as `labels: {}`
        metadata.labels = metadata.labels.filter(|m| !m.is_empty());
        metadata.annotations = metadata.annotations.filter(|m| !m.is_empty());
        Ok(metadata)
    }

    pub fn to_object_meta(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            namespace: self.namespace.clone(),
            labels: self.labels.clone(),
            annotations: self.annotations.clone(),
            ..Default::default()
        }
    }
}

/// A rendered Kubernetes object
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    /// Name of the payload block (`spec`, `configuration`, ...)
    pub payload_field: String,
    pub payload: Option<DynamicValue>,
}

impl Manifest {
    /// Build the manifest a definition renders for a configuration tree
    ///
    /// `apiVersion` and `kind` always come from the definition, never from the
    /// configuration.
    pub fn from_config(definition: &ResourceDefinition, config: &DynamicValue) -> Result<Self> {
        let metadata_value = config
            .get("metadata")
            .filter(|v| !v.is_null())
            .ok_or_else(|| EngineError::decode("metadata", "attribute is required"))?;
        let mut metadata = MetadataConfig::from_config(metadata_value)?;
        if !definition.namespaced {
            metadata.namespace = None;
        }

        let payload_name = to_snake_case(&definition.payload);
        let payload = match config.get(&payload_name).filter(|v| !v.is_null()) {
            Some(value) => convert_object(&definition.properties, value, &payload_name)?,
            None => None,
        };
        let payload = match payload {
            None if definition.payload_required => Some(DynamicValue::empty_map()),
            other => other,
        };

        Ok(Self {
            api_version: definition.api_version.clone(),
            kind: definition.kind.clone(),
            metadata: metadata.to_object_meta(),
            payload_field: definition.payload.clone(),
            payload,
        })
    }

    /// Render as a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Read a rendered manifest back
    pub fn parse(yaml: &str) -> Result<Self> {
        let value: DynamicValue = serde_yaml::from_str(yaml)
            .map_err(|e| EngineError::decode("manifest", e.to_string()))?;
        let map = value
            .as_map()
            .ok_or_else(|| EngineError::decode("manifest", "expected a mapping"))?;

        let field = |name: &str| -> Result<String> {
            map.get(name)
                .and_then(DynamicValue::as_str)
                .map(String::from)
                .ok_or_else(|| EngineError::decode("manifest", format!("missing '{}'", name)))
        };
        let api_version = field("apiVersion")?;
        let kind = field("kind")?;

        let metadata = match map.get("metadata") {
            Some(meta) => serde_json::from_value(meta.to_json())
                .map_err(|e| EngineError::decode("metadata", e.to_string()))?,
            None => ObjectMeta::default(),
        };

        let mut payload_fields = map
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "apiVersion" | "kind" | "metadata"));
        let (payload_field, payload) = match payload_fields.next() {
            Some((name, value)) => (name.clone(), Some(value.clone())),
            None => ("spec".to_string(), None),
        };
        if let Some((extra, _)) = payload_fields.next() {
            return Err(EngineError::decode(
                "manifest",
                format!("unexpected second payload field '{}'", extra),
            ));
        }

        Ok(Self {
            api_version,
            kind,
            metadata,
            payload_field,
            payload,
        })
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = if self.payload.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("apiVersion", &self.api_version)?;
        map.serialize_entry("kind", &self.kind)?;
        map.serialize_entry("metadata", &self.metadata)?;
        if let Some(payload) = &self.payload {
            map.serialize_entry(&self.payload_field, payload)?;
        }
        map.end()
    }
}

/// Map configuration names to manifest names, dropping everything empty
///
/// Returns `None` when nothing is left.
fn convert_object(
    properties: &IndexMap<String, Attribute>,
    value: &DynamicValue,
    path: &str,
) -> Result<Option<DynamicValue>> {
    let map = value
        .as_map()
        .ok_or_else(|| type_error(path, "object", value))?;

    let mut out = IndexMap::new();
    for (manifest_name, attr) in properties.iter().filter(|(_, a)| !a.computed) {
        let config_name = attr.config_name(manifest_name);
        let Some(child) = map.get(&config_name).filter(|v| !v.is_null()) else {
            continue;
        };
        let child_path = format!("{}.{}", path, config_name);
        if let Some(converted) = convert_value(attr, child, &child_path)? {
            out.insert(manifest_name.clone(), converted);
        }
    }

    Ok((!out.is_empty()).then_some(DynamicValue::Map(out)))
}

fn convert_value(attr: &Attribute, value: &DynamicValue, path: &str) -> Result<Option<DynamicValue>> {
    let converted = match attr.attr_type {
        AttributeType::String => match value {
            DynamicValue::String(_) => value.clone(),
            other => return Err(type_error(path, "string", other)),
        },
        AttributeType::Bool => match value {
            DynamicValue::Bool(_) => value.clone(),
            other => return Err(type_error(path, "bool", other)),
        },
        AttributeType::Integer => match value.as_integer() {
            Some(i) => DynamicValue::Int(i),
            None => return Err(type_error(path, "integer in the int64 range", value)),
        },
        AttributeType::Number => match value {
            DynamicValue::Int(_) | DynamicValue::Float(_) => value.clone(),
            other => return Err(type_error(path, "number", other)),
        },
        AttributeType::IntOrString => IntOrString::try_from(value)
            .map(DynamicValue::from)
            .map_err(|message| EngineError::decode(path, message))?,
        AttributeType::Map => {
            let map = value
                .as_map()
                .ok_or_else(|| type_error(path, "map of strings", value))?;
            for (key, entry) in map {
                if entry.as_str().is_none() && !entry.is_null() {
                    return Err(type_error(&format!("{}.{}", path, key), "string", entry));
                }
            }
            value.without_nulls()
        }
        AttributeType::List => {
            let items = value
                .as_seq()
                .ok_or_else(|| type_error(path, "list", value))?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                if item.is_null() {
                    continue;
                }
                let item_path = format!("{}[{}]", path, i);
                let converted = match &attr.items {
                    Some(item_attr) => convert_value(item_attr, item, &item_path)?
                        .unwrap_or_else(|| empty_like(item_attr, item)),
                    None => item.clone(),
                };
                out.push(converted);
            }
            DynamicValue::Seq(out)
        }
        AttributeType::Object => return convert_object(&attr.properties, value, path),
        AttributeType::Dynamic => value.clone(),
    };

    Ok((!converted.is_empty_collection()).then_some(converted))
}

/// An element that converts to nothing still holds its position, as an
/// empty value of its own type
fn empty_like(attr: &Attribute, value: &DynamicValue) -> DynamicValue {
    match attr.attr_type {
        AttributeType::List => DynamicValue::Seq(Vec::new()),
        AttributeType::Object | AttributeType::Map => DynamicValue::empty_map(),
        _ => value.clone(),
    }
}

fn type_error(path: &str, expected: &str, actual: &DynamicValue) -> EngineError {
    EngineError::decode(
        path,
        format!("expected {}, got {}", expected, actual.type_name()),
    )
}
