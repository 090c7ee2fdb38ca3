//! Engine error types

use crdform_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// Errors that abort a lifecycle operation
///
/// None of these are retried; the host keeps its prior state.
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("Configuration of {resource} is invalid")]
    #[diagnostic(
        code(crdform::engine::validation),
        help("fix the attributes listed above and retry")
    )]
    Validation {
        resource: String,
        diagnostics: Diagnostics,
    },

    #[error("Failed to render manifest: {0}")]
    #[diagnostic(code(crdform::engine::marshal))]
    Marshal(#[from] serde_yaml::Error),

    #[error("Failed to decode {what}: {message}")]
    #[diagnostic(code(crdform::engine::decode))]
    Decode { what: String, message: String },

    #[error("Unknown resource type '{name}'")]
    #[diagnostic(code(crdform::engine::unknown_resource))]
    UnknownResource {
        name: String,
        #[help]
        suggestion: Option<String>,
    },

    #[error("Resource type '{name}' is registered twice")]
    #[diagnostic(
        code(crdform::engine::duplicate_resource),
        help("set an explicit typeName on one of the definitions")
    )]
    DuplicateResource { name: String },

    #[error(transparent)]
    #[diagnostic(code(crdform::engine::definition))]
    Definition(#[from] CoreError),
}

impl EngineError {
    pub fn decode(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Diagnostics attached to a validation failure
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Validation { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
