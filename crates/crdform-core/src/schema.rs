//! Attribute schema for resources and its validator
//!
//! A [`Schema`] declares the typed attributes of one resource, keyed by their
//! manifest (camelCase) names. User configuration uses the snake_case form of
//! those names unless an attribute overrides it.
//!
//! Structural checks (types, required, enum, pattern, bounds) go through the
//! `jsonschema` crate. Kubernetes format checks, unknown attributes and
//! computed attributes are handled by a second walk over the configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt;

use crate::dynamic::DynamicValue;
use crate::error::{CoreError, Result, ValidationErrorInfo};
use crate::suggestions::suggest_attribute;
use crate::validation::Format;

/// Attribute value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    String,
    Bool,
    Integer,
    Number,
    /// `map[string]string`
    Map,
    List,
    Object,
    IntOrString,
    /// Untyped subtree, passed through as-is
    Dynamic,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Map => "map",
            Self::List => "list",
            Self::Object => "object",
            Self::IntOrString => "intOrString",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    /// Set by the provider, never by the user
    #[serde(default, skip_serializing_if = "is_false")]
    pub computed: bool,

    /// Configuration name override (defaults to the snake_case manifest name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    /// Nested attributes of an `object`, keyed by manifest name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Attribute>,

    /// Element type of a `list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Attribute>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Attribute {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            description: None,
            required: false,
            computed: false,
            attribute: None,
            enum_values: None,
            pattern: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            min_items: None,
            max_items: None,
            format: None,
            properties: IndexMap::new(),
            items: None,
        }
    }

    pub fn object(properties: IndexMap<String, Attribute>) -> Self {
        Self {
            properties,
            ..Self::new(AttributeType::Object)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Name of this attribute in user configuration
    pub fn config_name(&self, manifest_name: &str) -> String {
        self.attribute
            .clone()
            .unwrap_or_else(|| to_snake_case(manifest_name))
    }

    /// Find a nested property by its configuration name
    pub fn property_by_config_name(&self, config_name: &str) -> Option<(&String, &Attribute)> {
        find_by_config_name(&self.properties, config_name)
    }

    fn to_json_schema(&self) -> JsonValue {
        let mut json = serde_json::Map::new();

        match self.attr_type {
            AttributeType::String => {
                json.insert("type".into(), "string".into());
            }
            AttributeType::Bool => {
                json.insert("type".into(), "boolean".into());
            }
            AttributeType::Integer => {
                json.insert("type".into(), "integer".into());
            }
            AttributeType::Number => {
                json.insert("type".into(), "number".into());
            }
            AttributeType::IntOrString => {
                json.insert("type".into(), serde_json::json!(["integer", "string"]));
            }
            AttributeType::Map => {
                json.insert("type".into(), "object".into());
                json.insert(
                    "additionalProperties".into(),
                    serde_json::json!({ "type": "string" }),
                );
            }
            AttributeType::List => {
                json.insert("type".into(), "array".into());
                if let Some(items) = &self.items {
                    json.insert("items".into(), items.to_json_schema());
                }
            }
            AttributeType::Object => {
                json.insert("type".into(), "object".into());
                let (properties, required) = properties_to_json_schema(&self.properties);
                json.insert("properties".into(), properties);
                if !required.is_empty() {
                    json.insert("required".into(), required.into());
                }
            }
            // JSON Schema has no "any" type, the empty schema accepts everything
            AttributeType::Dynamic => {}
        }

        if let Some(desc) = &self.description {
            json.insert("description".into(), JsonValue::String(desc.clone()));
        }
        if let Some(values) = &self.enum_values {
            json.insert("enum".into(), JsonValue::Array(values.clone()));
        }
        if let Some(pattern) = &self.pattern {
            json.insert("pattern".into(), JsonValue::String(pattern.clone()));
        }
        if let Some(min) = self.min {
            json.insert("minimum".into(), JsonValue::from(min));
        }
        if let Some(max) = self.max {
            json.insert("maximum".into(), JsonValue::from(max));
        }
        if let Some(min_len) = self.min_length {
            json.insert("minLength".into(), JsonValue::from(min_len));
        }
        if let Some(max_len) = self.max_length {
            json.insert("maxLength".into(), JsonValue::from(max_len));
        }
        if let Some(min_items) = self.min_items {
            json.insert("minItems".into(), JsonValue::from(min_items));
        }
        if let Some(max_items) = self.max_items {
            json.insert("maxItems".into(), JsonValue::from(max_items));
        }

        JsonValue::Object(json)
    }
}

/// Convert a camelCase manifest name to its snake_case configuration name
pub fn to_snake_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + value.len() / 4);
    let mut prev_upper = false;

    for (i, c) in value.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !prev_upper {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_upper = true;
        } else if c == '-' || c == '.' || c == ' ' {
            result.push('_');
            prev_upper = false;
        } else {
            result.push(c);
            prev_upper = false;
        }
    }

    result
}

fn find_by_config_name<'a>(
    attributes: &'a IndexMap<String, Attribute>,
    config_name: &str,
) -> Option<(&'a String, &'a Attribute)> {
    attributes
        .iter()
        .find(|(name, attr)| attr.config_name(name) == config_name)
}

/// Computed attributes are left out: their configured values are ignored
fn properties_to_json_schema(props: &IndexMap<String, Attribute>) -> (JsonValue, Vec<JsonValue>) {
    let mut json_props = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, attr) in props.iter().filter(|(_, a)| !a.computed) {
        let config_name = attr.config_name(name);
        json_props.insert(config_name.clone(), attr.to_json_schema());
        if attr.required {
            required.push(JsonValue::String(config_name));
        }
    }

    (JsonValue::Object(json_props), required)
}

/// Top-level attributes of one resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub attributes: IndexMap<String, Attribute>,
}

impl Schema {
    pub fn new(attributes: IndexMap<String, Attribute>) -> Self {
        Self {
            description: None,
            attributes,
        }
    }

    /// Look up a top-level attribute by manifest name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// JSON Schema (draft 7) describing valid user configuration
    pub fn to_json_schema(&self) -> JsonValue {
        let mut schema = serde_json::Map::new();
        schema.insert(
            "$schema".into(),
            JsonValue::String("http://json-schema.org/draft-07/schema#".into()),
        );
        schema.insert("type".into(), JsonValue::String("object".into()));
        if let Some(desc) = &self.description {
            schema.insert("description".into(), JsonValue::String(desc.clone()));
        }

        let (properties, required) = properties_to_json_schema(&self.attributes);
        schema.insert("properties".into(), properties);
        if !required.is_empty() {
            schema.insert("required".into(), JsonValue::Array(required));
        }

        JsonValue::Object(schema)
    }
}

/// Result of schema validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// `false` if any finding has error severity
    pub is_valid: bool,
    /// Errors and warnings, in discovery order
    pub errors: Vec<ValidationErrorInfo>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    pub fn from_findings(errors: Vec<ValidationErrorInfo>) -> Self {
        Self {
            is_valid: !errors.iter().any(ValidationErrorInfo::is_error),
            errors,
        }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationErrorInfo> {
        self.errors.iter().filter(|e| !e.is_error())
    }
}

/// Schema validator with cached compiled schema
pub struct SchemaValidator {
    schema: Schema,
    compiled: jsonschema::Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    pub fn new(schema: Schema) -> Result<Self> {
        let json_schema = schema.to_json_schema();
        let compiled =
            jsonschema::validator_for(&json_schema).map_err(|e| CoreError::InvalidSchema {
                message: e.to_string(),
            })?;

        Ok(Self { schema, compiled })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate a configuration tree, collecting every finding
    ///
    /// Null values count as absent.
    pub fn validate(&self, config: &DynamicValue) -> ValidationResult {
        let config = config.without_nulls();
        let instance = config.to_json();

        let mut errors = Vec::new();
        let mut failed = HashSet::new();

        for error in self.compiled.iter_errors(&instance) {
            let parent = pointer_to_path(&error.instance_path.to_string(), &instance);
            if let jsonschema::error::ValidationErrorKind::Required { property } = &error.kind {
                let name = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                errors.push(ValidationErrorInfo::error(
                    display_path(&join_path(&parent, &name)),
                    format!("Missing required attribute `{}`", name),
                ));
                continue;
            }
            errors.push(ValidationErrorInfo::error(
                display_path(&parent),
                format_validation_error(&error),
            ));
            failed.insert(parent);
        }

        walk_attributes(&self.schema.attributes, &config, "", &failed, &mut errors);

        ValidationResult::from_findings(errors)
    }
}

fn walk_attributes(
    attributes: &IndexMap<String, Attribute>,
    value: &DynamicValue,
    path: &str,
    failed: &HashSet<String>,
    errors: &mut Vec<ValidationErrorInfo>,
) {
    let Some(map) = value.as_map() else {
        return;
    };

    for (key, child) in map {
        let child_path = join_path(path, key);

        let Some((_, attr)) = find_by_config_name(attributes, key) else {
            let available: Vec<String> = attributes
                .iter()
                .filter(|(_, a)| !a.computed)
                .map(|(name, a)| a.config_name(name))
                .collect();
            errors.push(
                ValidationErrorInfo::error(
                    display_path(&child_path),
                    format!("Unsupported attribute `{}`", key),
                )
                .with_suggestion(suggest_attribute(key, &available)),
            );
            continue;
        };

        if attr.computed {
            tracing::warn!(attribute = %child_path, "ignoring configured value of computed attribute");
            errors.push(ValidationErrorInfo::warning(
                display_path(&child_path),
                format!(
                    "`{}` is computed by the provider, the configured value is ignored",
                    key
                ),
            ));
            continue;
        }

        check_attribute(attr, child, &child_path, failed, errors);
    }
}

fn check_attribute(
    attr: &Attribute,
    value: &DynamicValue,
    path: &str,
    failed: &HashSet<String>,
    errors: &mut Vec<ValidationErrorInfo>,
) {
    if let Some(format) = attr.format {
        if !has_failure_at_or_under(failed, path) {
            if let Err(e) = format.check(value) {
                errors.push(ValidationErrorInfo::error(display_path(path), e.to_string()));
            }
        }
    }

    match attr.attr_type {
        AttributeType::Object => walk_attributes(&attr.properties, value, path, failed, errors),
        AttributeType::List => {
            if let (Some(items), Some(seq)) = (&attr.items, value.as_seq()) {
                for (i, item) in seq.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    check_attribute(items, item, &item_path, failed, errors);
                }
            }
        }
        _ => {}
    }
}

fn has_failure_at_or_under(failed: &HashSet<String>, path: &str) -> bool {
    failed.iter().any(|p| {
        p == path
            || p.strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
    })
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

/// Convert a JSON pointer (`/spec/endpoints/0/port`) to `spec.endpoints[0].port`
fn pointer_to_path(pointer: &str, instance: &JsonValue) -> String {
    let mut path = String::new();
    let mut current = Some(instance);

    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        match current {
            Some(JsonValue::Array(items)) => {
                path.push_str(&format!("[{}]", segment));
                current = segment.parse::<usize>().ok().and_then(|i| items.get(i));
            }
            other => {
                path = join_path(&path, &segment);
                current = other.and_then(|v| v.get(&segment));
            }
        }
    }

    path
}

fn format_validation_error(error: &jsonschema::ValidationError) -> String {
    error.to_string().replace('"', "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate_schema() -> Schema {
        let yaml = r#"
attributes:
  id:
    type: integer
    computed: true
  metadata:
    type: object
    required: true
    properties:
      name:
        type: string
        required: true
        format: k8sName
      namespace:
        type: string
        format: dnsLabel
      labels:
        type: map
        format: labels
  spec:
    type: object
    properties:
      secretName:
        type: string
        required: true
      dnsNames:
        type: list
        minItems: 1
        items:
          type: string
      privateKey:
        type: object
        properties:
          algorithm:
            type: string
            enum: [RSA, ECDSA, Ed25519]
          size:
            type: integer
            min: 0
            max: 8192
      endpoints:
        type: list
        items:
          type: object
          properties:
            port:
              type: intOrString
      values:
        type: dynamic
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    fn validate(config: &str) -> ValidationResult {
        let validator = SchemaValidator::new(certificate_schema()).unwrap();
        validator.validate(&DynamicValue::from_yaml(config).unwrap())
    }

    #[test]
    fn test_snake_case_names() {
        assert_eq!(to_snake_case("secretName"), "secret_name");
        assert_eq!(to_snake_case("apiVersion"), "api_version");
        assert_eq!(to_snake_case("dnsNames"), "dns_names");
        assert_eq!(to_snake_case("URIs"), "uris");
        assert_eq!(to_snake_case("name"), "name");
    }

    #[test]
    fn test_config_name_override() {
        let mut attr = Attribute::new(AttributeType::String);
        assert_eq!(attr.config_name("ipAddresses"), "ip_addresses");
        attr.attribute = Some("ips".into());
        assert_eq!(attr.config_name("ipAddresses"), "ips");
    }

    #[test]
    fn test_json_schema_uses_config_names() {
        let json = certificate_schema().to_json_schema();
        let spec = &json["properties"]["spec"];
        assert!(spec["properties"].get("secret_name").is_some());
        assert!(spec["properties"].get("secretName").is_none());
        assert_eq!(spec["required"], serde_json::json!(["secret_name"]));
        assert_eq!(
            spec["properties"]["endpoints"]["items"]["properties"]["port"]["type"],
            serde_json::json!(["integer", "string"])
        );
        assert_eq!(json["required"], serde_json::json!(["metadata"]));
        // computed attributes are not part of the configuration schema
        assert!(json["properties"].get("id").is_none());
    }

    #[test]
    fn test_valid_config() {
        let result = validate(
            r#"
metadata:
  name: valid-name-1
  namespace: default
  labels:
    app.kubernetes.io/name: web
spec:
  secret_name: web-tls
  dns_names: [example.com]
  private_key:
    algorithm: ECDSA
    size: 256
  endpoints:
    - port: 8080
    - port: https
  values:
    anything: [goes, 1, true]
"#,
        );
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_invalid_name_rejected() {
        let result = validate("metadata:\n  name: Invalid_Name!\n");
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "metadata.name");
        assert!(result.errors[0].message.contains("RFC 1123"));
    }

    #[test]
    fn test_missing_required() {
        let result = validate("spec:\n  dns_names: [a.example.com]\n");
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"metadata"));
        assert!(paths.contains(&"spec.secret_name"));
    }

    #[test]
    fn test_null_counts_as_absent() {
        let result = validate("metadata:\n  name: web\n  namespace: null\nspec: ~\n");
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_structural_errors_have_dotted_paths() {
        let result = validate(
            r#"
metadata:
  name: web
spec:
  secret_name: tls
  dns_names: []
  private_key:
    algorithm: DSA
    size: 100000
  endpoints:
    - port: [1]
"#,
        );
        assert!(!result.is_valid);
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"spec.dns_names"));
        assert!(paths.contains(&"spec.private_key.algorithm"));
        assert!(paths.contains(&"spec.private_key.size"));
        assert!(paths.contains(&"spec.endpoints[0].port"));
    }

    #[test]
    fn test_type_error_not_reported_twice() {
        let result = validate("metadata:\n  name: 42\n");
        let name_errors: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.path == "metadata.name")
            .collect();
        assert_eq!(name_errors.len(), 1);
    }

    #[test]
    fn test_label_format_checked() {
        let result = validate("metadata:\n  name: web\n  labels:\n    bad key: x\n");
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].path, "metadata.labels");
    }

    #[test]
    fn test_unknown_attribute_with_suggestion() {
        let result = validate("metadata:\n  name: web\nspec:\n  secret_name: tls\n  secret_nme: x\n");
        assert!(!result.is_valid);
        let error = &result.errors[0];
        assert_eq!(error.path, "spec.secret_nme");
        assert!(error.suggestion.as_deref().unwrap().contains("`secret_name`"));
    }

    #[test]
    fn test_computed_attribute_is_a_warning() {
        let result = validate("id: 5\nmetadata:\n  name: web\n");
        assert!(result.is_valid);
        assert_eq!(result.warnings().count(), 1);
        assert_eq!(result.errors[0].path, "id");
    }

    #[test]
    fn test_root_must_be_an_object() {
        let result = validate("- a\n- b\n");
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].path, "(root)");
    }
}
