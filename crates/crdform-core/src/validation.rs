//! Kubernetes syntax checks for names, labels, annotations and base64 content
//!
//! The rules follow apimachinery's `pkg/util/validation`. Every check is a pure
//! function that either passes or returns all problems it found.

use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::dynamic::DynamicValue;

const RFC_1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const RFC_1123_LABEL_MAX_LENGTH: usize = 63;
const RFC_1123_LABEL_ERROR_MSG: &str = "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character";

const RFC_1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
const RFC_1123_SUBDOMAIN_ERROR_MSG: &str = "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character";

const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";
const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
const QUALIFIED_NAME_ERROR_MSG: &str = "name part must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character";

const LABEL_VALUE_MAX_LENGTH: usize = 63;
const LABEL_VALUE_ERROR_MSG: &str = "a valid label must be an empty string or consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character";

/// Total size limit of all annotation keys and values on one object
pub const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;

static RFC_1123_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{RFC_1123_LABEL_FMT}$")).expect("failed to compile RFC 1123 label regex")
});

static RFC_1123_SUBDOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^{RFC_1123_LABEL_FMT}(\\.{RFC_1123_LABEL_FMT})*$"
    ))
    .expect("failed to compile RFC 1123 subdomain regex")
});

static QUALIFIED_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{QUALIFIED_NAME_FMT}$")).expect("failed to compile qualified name regex")
});

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{msg} (regex used for validation is {regex:?})")]
    Regex { msg: &'static str, regex: String },

    #[error("must be no more than {max_length} bytes, got {length}")]
    TooLong { length: usize, max_length: usize },

    #[error("must not be empty")]
    Empty,

    #[error("prefix part {prefix:?}: {source}")]
    Prefix {
        prefix: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("key {key:?}: {source}")]
    Key {
        key: String,
        #[source]
        source: Box<ValidationErrors>,
    },

    #[error("value {value:?} of key {key:?}: {source}")]
    Value {
        key: String,
        value: String,
        #[source]
        source: Box<ValidationErrors>,
    },

    #[error("is not valid base64: {message}")]
    Base64 { message: String },

    #[error("expected {expected}, got {actual}")]
    Type {
        expected: &'static str,
        actual: &'static str,
    },
}

/// All failures found by one check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            let prefix = match i {
                0 => "",
                _ => ", ",
            };
            write!(f, "{prefix}{error}")?;
        }
        Ok(())
    }
}

type Result<T = (), E = ValidationErrors> = std::result::Result<T, E>;

fn validate_str_length(value: &str, max_length: usize) -> Result<(), ValidationError> {
    if value.len() > max_length {
        Err(ValidationError::TooLong {
            length: value.len(),
            max_length,
        })
    } else {
        Ok(())
    }
}

fn validate_str_regex(
    value: &str,
    regex: &Regex,
    msg: &'static str,
) -> Result<(), ValidationError> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::Regex {
            msg,
            regex: regex
                .as_str()
                .trim_start_matches('^')
                .trim_end_matches('$')
                .to_string(),
        })
    }
}

/// Returns [`Ok`] if *all* validations are [`Ok`], otherwise returns all errors
fn validate_all(validations: impl IntoIterator<Item = Result<(), ValidationError>>) -> Result {
    let errors: Vec<ValidationError> = validations.into_iter().filter_map(|r| r.err()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Object names (`metadata.name`): a DNS subdomain
pub fn is_rfc_1123_subdomain(value: &str) -> Result {
    if value.is_empty() {
        return Err(ValidationErrors(vec![ValidationError::Empty]));
    }
    validate_all([
        validate_str_length(value, RFC_1123_SUBDOMAIN_MAX_LENGTH),
        validate_str_regex(value, &RFC_1123_SUBDOMAIN_REGEX, RFC_1123_SUBDOMAIN_ERROR_MSG),
    ])
}

/// Namespaces: a single DNS label
pub fn is_rfc_1123_label(value: &str) -> Result {
    if value.is_empty() {
        return Err(ValidationErrors(vec![ValidationError::Empty]));
    }
    validate_all([
        validate_str_length(value, RFC_1123_LABEL_MAX_LENGTH),
        validate_str_regex(value, &RFC_1123_LABEL_REGEX, RFC_1123_LABEL_ERROR_MSG),
    ])
}

/// Label and annotation keys: `[prefix/]name`
pub fn is_qualified_name(value: &str) -> Result {
    let (prefix, name) = match value.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, value),
    };

    let mut errors = Vec::new();

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            errors.push(ValidationError::Prefix {
                prefix: prefix.to_string(),
                source: Box::new(ValidationError::Empty),
            });
        } else if let Err(prefix_errors) = is_rfc_1123_subdomain(prefix) {
            errors.extend(prefix_errors.0.into_iter().map(|e| ValidationError::Prefix {
                prefix: prefix.to_string(),
                source: Box::new(e),
            }));
        }
    }

    if name.is_empty() {
        errors.push(ValidationError::Empty);
    } else {
        if let Err(e) = validate_str_length(name, QUALIFIED_NAME_MAX_LENGTH) {
            errors.push(e);
        }
        if let Err(e) = validate_str_regex(name, &QUALIFIED_NAME_REGEX, QUALIFIED_NAME_ERROR_MSG) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Label values: empty, or a qualified name part
pub fn is_label_value(value: &str) -> Result {
    if value.is_empty() {
        return Ok(());
    }
    validate_all([
        validate_str_length(value, LABEL_VALUE_MAX_LENGTH),
        validate_str_regex(value, &QUALIFIED_NAME_REGEX, LABEL_VALUE_ERROR_MSG),
    ])
}

pub fn validate_labels(labels: &BTreeMap<String, String>) -> Result {
    let mut errors = Vec::new();
    for (key, value) in labels {
        if let Err(e) = is_qualified_name(key) {
            errors.push(ValidationError::Key {
                key: key.clone(),
                source: Box::new(e),
            });
        }
        if let Err(e) = is_label_value(value) {
            errors.push(ValidationError::Value {
                key: key.clone(),
                value: value.clone(),
                source: Box::new(e),
            });
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

pub fn validate_annotations(annotations: &BTreeMap<String, String>) -> Result {
    let mut errors = Vec::new();
    let mut total_size = 0;
    for (key, value) in annotations {
        total_size += key.len() + value.len();
        if let Err(e) = is_qualified_name(&key.to_lowercase()) {
            errors.push(ValidationError::Key {
                key: key.clone(),
                source: Box::new(e),
            });
        }
    }
    if let Err(e) = validate_str_length_total(total_size) {
        errors.push(e);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn validate_str_length_total(total_size: usize) -> Result<(), ValidationError> {
    if total_size > TOTAL_ANNOTATION_SIZE_LIMIT {
        Err(ValidationError::TooLong {
            length: total_size,
            max_length: TOTAL_ANNOTATION_SIZE_LIMIT,
        })
    } else {
        Ok(())
    }
}

/// Standard-alphabet base64 that actually decodes
pub fn is_base64(value: &str) -> Result {
    base64::engine::general_purpose::STANDARD
        .decode(value.trim().as_bytes())
        .map(|_| ())
        .map_err(|e| {
            ValidationErrors(vec![ValidationError::Base64 {
                message: e.to_string(),
            }])
        })
}

/// Named checks that schemas can attach to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Format {
    /// Object name (RFC 1123 subdomain)
    K8sName,
    /// Namespace-like name (RFC 1123 label)
    DnsLabel,
    /// Label map
    Labels,
    /// Annotation map
    Annotations,
    /// Base64 content
    Base64,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::K8sName => "k8sName",
            Self::DnsLabel => "dnsLabel",
            Self::Labels => "labels",
            Self::Annotations => "annotations",
            Self::Base64 => "base64",
        }
    }

    /// Run this check against a configuration value
    pub fn check(&self, value: &DynamicValue) -> Result {
        match self {
            Self::K8sName => is_rfc_1123_subdomain(expect_str(value)?),
            Self::DnsLabel => is_rfc_1123_label(expect_str(value)?),
            Self::Base64 => is_base64(expect_str(value)?),
            Self::Labels => validate_labels(&expect_string_map(value)?),
            Self::Annotations => validate_annotations(&expect_string_map(value)?),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn expect_str(value: &DynamicValue) -> Result<&str> {
    value.as_str().ok_or_else(|| {
        ValidationErrors(vec![ValidationError::Type {
            expected: "string",
            actual: value.type_name(),
        }])
    })
}

fn expect_string_map(value: &DynamicValue) -> Result<BTreeMap<String, String>> {
    let map = value.as_map().ok_or_else(|| {
        ValidationErrors(vec![ValidationError::Type {
            expected: "map of strings",
            actual: value.type_name(),
        }])
    })?;
    map.iter()
        .map(|(k, v)| {
            v.as_str().map(|s| (k.clone(), s.to_string())).ok_or_else(|| {
                ValidationErrors(vec![ValidationError::Type {
                    expected: "string value",
                    actual: v.type_name(),
                }])
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_names() {
        assert!(is_rfc_1123_subdomain("valid-name-1").is_ok());
        assert!(is_rfc_1123_subdomain("my-cluster").is_ok());
        assert!(is_rfc_1123_subdomain("example.com").is_ok());

        let err = is_rfc_1123_subdomain("Invalid_Name!").unwrap_err();
        assert!(err.to_string().contains("RFC 1123 subdomain"));

        assert!(is_rfc_1123_subdomain("").is_err());
        assert!(is_rfc_1123_subdomain("-leading").is_err());
        assert!(is_rfc_1123_subdomain(&"a".repeat(254)).is_err());
    }

    #[test]
    fn test_too_long_and_bad_syntax_both_reported() {
        let name = format!("{}_", "a".repeat(300));
        let err = is_rfc_1123_subdomain(&name).unwrap_err();
        assert_eq!(err.0.len(), 2);
    }

    #[test]
    fn test_namespace_labels() {
        assert!(is_rfc_1123_label("kube-system").is_ok());
        assert!(is_rfc_1123_label("with.dot").is_err());
        assert!(is_rfc_1123_label(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_qualified_names() {
        assert!(is_qualified_name("app").is_ok());
        assert!(is_qualified_name("app.kubernetes.io/name").is_ok());
        assert!(is_qualified_name("Some_Key.v1").is_ok());
        assert!(is_qualified_name("/name").is_err());
        assert!(is_qualified_name("Example.COM/name").is_err());
        assert!(is_qualified_name("prefix/").is_err());
        assert!(is_qualified_name("-bad").is_err());
    }

    #[test]
    fn test_label_values() {
        assert!(is_label_value("").is_ok());
        assert!(is_label_value("v1.2.3").is_ok());
        assert!(is_label_value("has space").is_err());
        assert!(is_label_value(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_label_map() {
        let mut labels = BTreeMap::new();
        labels.insert("app.kubernetes.io/name".to_string(), "web".to_string());
        assert!(validate_labels(&labels).is_ok());

        labels.insert("bad key".to_string(), "bad value!".to_string());
        let err = validate_labels(&labels).unwrap_err();
        assert_eq!(err.0.len(), 2);
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn test_annotation_map() {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            "cert-manager.io/issuer".to_string(),
            "any value at all, spaces included!".to_string(),
        );
        assert!(validate_annotations(&annotations).is_ok());

        annotations.insert("huge".to_string(), "x".repeat(TOTAL_ANNOTATION_SIZE_LIMIT));
        assert!(validate_annotations(&annotations).is_err());
    }

    #[test]
    fn test_base64() {
        assert!(is_base64("aGVsbG8=").is_ok());
        assert!(is_base64("not base64!").is_err());
    }

    #[test]
    fn test_format_checks_on_dynamic_values() {
        assert!(Format::K8sName.check(&DynamicValue::from("web-1")).is_ok());
        assert!(Format::K8sName.check(&DynamicValue::Int(1)).is_err());

        let labels = DynamicValue::from_yaml("app: web\ntier: frontend").unwrap();
        assert!(Format::Labels.check(&labels).is_ok());

        let bad = DynamicValue::from_yaml("app: 3").unwrap();
        let err = Format::Labels.check(&bad).unwrap_err();
        assert!(err.to_string().contains("expected string value"));
    }
}
