//! Core error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Definition not found: {path}")]
    DefinitionNotFound { path: String },

    #[error("Invalid resource definition {name}: {message}")]
    InvalidDefinition { name: String, message: String },

    #[error("Invalid CustomResourceDefinition: {message}")]
    InvalidCrd { message: String },

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config merge error: {message}")]
    ConfigMerge { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// How serious a validation finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single validation finding, located by a dotted attribute path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorInfo {
    /// Attribute path (e.g. `metadata.labels` or `spec.endpoints[0].port`)
    pub path: String,

    /// Human-readable message
    pub message: String,

    pub severity: Severity,

    /// Hint for fixing the problem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationErrorInfo {
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
            suggestion: None,
        }
    }

    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
