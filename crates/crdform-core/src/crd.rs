//! Import `CustomResourceDefinition` manifests as resource definitions
//!
//! Each served version of a CRD becomes one [`ResourceDefinition`] whose
//! properties mirror the version's `openAPIV3Schema` payload block.

use indexmap::IndexMap;
use std::path::Path;

use crate::definition::ResourceDefinition;
use crate::dynamic::DynamicValue;
use crate::error::{CoreError, Result};
use crate::schema::{Attribute, AttributeType};
use crate::validation::Format;

/// Top-level fields that are never the payload
const NON_PAYLOAD_FIELDS: &[&str] = &["apiVersion", "kind", "metadata", "status"];

/// Converter from CRD manifests to resource definitions
pub struct CrdImporter;

impl CrdImporter {
    /// Import every CRD in a (multi-document) YAML string
    pub fn import(yaml: &str) -> Result<Vec<ResourceDefinition>> {
        let mut definitions = Vec::new();

        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value: DynamicValue = serde::Deserialize::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            definitions.extend(Self::import_value(&value)?);
        }

        Ok(definitions)
    }

    pub fn import_file<P: AsRef<Path>>(path: P) -> Result<Vec<ResourceDefinition>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::import(&content)
    }

    /// Import a single parsed CRD
    pub fn import_value(crd: &DynamicValue) -> Result<Vec<ResourceDefinition>> {
        let kind = crd
            .get("kind")
            .and_then(DynamicValue::as_str)
            .ok_or_else(|| invalid("Missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(invalid(format!(
                "Expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let spec = crd
            .get("spec")
            .ok_or_else(|| invalid("Missing 'spec' field"))?;

        let group = spec
            .get("group")
            .and_then(DynamicValue::as_str)
            .ok_or_else(|| invalid("Missing 'spec.group' field"))?;

        let kind = spec
            .get_path("names.kind")
            .and_then(DynamicValue::as_str)
            .ok_or_else(|| invalid("Missing 'spec.names.kind' field"))?;

        let namespaced = spec.get("scope").and_then(DynamicValue::as_str) != Some("Cluster");

        let versions = spec
            .get("versions")
            .and_then(DynamicValue::as_seq)
            .ok_or_else(|| invalid("Missing 'spec.versions' array"))?;

        let mut definitions = Vec::new();
        for version in versions {
            let name = version
                .get("name")
                .and_then(DynamicValue::as_str)
                .ok_or_else(|| invalid("Version missing 'name' field"))?;

            let served = version
                .get("served")
                .and_then(DynamicValue::as_bool)
                .unwrap_or(true);
            if !served {
                tracing::debug!(kind, version = name, "skipping version that is not served");
                continue;
            }

            let Some(schema) = version.get_path("schema.openAPIV3Schema") else {
                tracing::warn!(kind, version = name, "skipping version without openAPIV3Schema");
                continue;
            };

            let definition =
                Self::convert_version(&format!("{}/{}", group, name), kind, namespaced, schema);
            definition.validate()?;
            definitions.push(definition);
        }

        Ok(definitions)
    }

    fn convert_version(
        api_version: &str,
        kind: &str,
        namespaced: bool,
        schema: &DynamicValue,
    ) -> ResourceDefinition {
        let mut definition = ResourceDefinition::new(api_version, kind);
        definition.namespaced = namespaced;
        definition.description = string_field(schema, "description");

        let Some(top) = schema.get("properties").and_then(DynamicValue::as_map) else {
            tracing::warn!(kind, "CRD schema declares no top-level properties");
            return definition;
        };

        let payload = if top.contains_key("spec") {
            Some("spec")
        } else {
            top.keys()
                .map(String::as_str)
                .find(|name| !NON_PAYLOAD_FIELDS.contains(name))
        };

        let Some(payload) = payload else {
            tracing::warn!(kind, "CRD schema has no payload field");
            return definition;
        };

        definition.payload = payload.to_string();
        definition.payload_required = required_names(schema).iter().any(|r| r == payload);

        let payload_schema = &top[payload];
        match payload_schema.get("properties").and_then(DynamicValue::as_map) {
            Some(props) => {
                let required = required_names(payload_schema);
                definition.properties = convert_properties(payload, props, &required);
            }
            None => {
                tracing::warn!(kind, payload, "payload declares no properties, nothing to map");
            }
        }

        definition
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidCrd {
        message: message.into(),
    }
}

fn string_field(value: &DynamicValue, key: &str) -> Option<String> {
    value.get(key).and_then(DynamicValue::as_str).map(String::from)
}

fn flag(value: &DynamicValue, key: &str) -> bool {
    value
        .get(key)
        .and_then(DynamicValue::as_bool)
        .unwrap_or(false)
}

fn usize_field(value: &DynamicValue, key: &str) -> Option<usize> {
    value
        .get(key)
        .and_then(DynamicValue::as_i64)
        .and_then(|n| usize::try_from(n).ok())
}

fn required_names(schema: &DynamicValue) -> Vec<String> {
    schema
        .get("required")
        .and_then(DynamicValue::as_seq)
        .map(|items| {
            items
                .iter()
                .filter_map(DynamicValue::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn convert_properties(
    path: &str,
    props: &IndexMap<String, DynamicValue>,
    required: &[String],
) -> IndexMap<String, Attribute> {
    props
        .iter()
        .map(|(name, prop)| {
            let mut attr = convert_property(&format!("{}.{}", path, name), prop);
            attr.required = required.contains(name);
            (name.clone(), attr)
        })
        .collect()
}

fn convert_property(path: &str, prop: &DynamicValue) -> Attribute {
    let mut attr = match prop.get("type").and_then(DynamicValue::as_str) {
        _ if flag(prop, "x-kubernetes-int-or-string") => Attribute::new(AttributeType::IntOrString),
        Some("string") => {
            let mut attr = Attribute::new(AttributeType::String);
            if prop.get("format").and_then(DynamicValue::as_str) == Some("byte") {
                attr.format = Some(Format::Base64);
            }
            attr
        }
        Some("integer") => Attribute::new(AttributeType::Integer),
        Some("number") => Attribute::new(AttributeType::Number),
        Some("boolean") => Attribute::new(AttributeType::Bool),
        Some("array") => match prop.get("items") {
            Some(items) => Attribute {
                items: Some(Box::new(convert_property(&format!("{}[]", path), items))),
                ..Attribute::new(AttributeType::List)
            },
            None => {
                tracing::warn!(path, "array without items, mapped as dynamic");
                Attribute::new(AttributeType::Dynamic)
            }
        },
        Some("object") => convert_object(path, prop),
        other => {
            if !flag(prop, "x-kubernetes-preserve-unknown-fields") {
                tracing::warn!(path, schema_type = ?other, "unsupported schema type, mapped as dynamic");
            }
            Attribute::new(AttributeType::Dynamic)
        }
    };

    attr.description = string_field(prop, "description");
    attr.enum_values = prop
        .get("enum")
        .and_then(DynamicValue::as_seq)
        .map(|values| values.iter().map(DynamicValue::to_json).collect());
    attr.pattern = string_field(prop, "pattern").filter(|pattern| {
        let compiles = regex::Regex::new(pattern).is_ok();
        if !compiles {
            tracing::warn!(path, pattern = pattern.as_str(), "dropping pattern the regex engine cannot compile");
        }
        compiles
    });
    attr.min = prop.get("minimum").and_then(DynamicValue::as_f64);
    attr.max = prop.get("maximum").and_then(DynamicValue::as_f64);
    attr.min_length = usize_field(prop, "minLength");
    attr.max_length = usize_field(prop, "maxLength");
    attr.min_items = usize_field(prop, "minItems");
    attr.max_items = usize_field(prop, "maxItems");

    attr
}

fn convert_object(path: &str, prop: &DynamicValue) -> Attribute {
    if let Some(props) = prop
        .get("properties")
        .and_then(DynamicValue::as_map)
        .filter(|p| !p.is_empty())
    {
        return Attribute::object(convert_properties(path, props, &required_names(prop)));
    }

    let additional_type = prop
        .get_path("additionalProperties.type")
        .and_then(DynamicValue::as_str);
    if additional_type == Some("string") {
        return Attribute::new(AttributeType::Map);
    }

    if additional_type.is_some() {
        tracing::warn!(path, "map with non-string values, mapped as dynamic");
    }
    Attribute::new(AttributeType::Dynamic)
}
