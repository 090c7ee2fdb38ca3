//! CLI error type and its exit codes

use crdform_core::CoreError;
use crdform_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Validation failed: {message}")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Raised after the findings were already printed
    #[error("Validation failed with {errors} error(s) and {warnings} warning(s)")]
    #[diagnostic(code(crdform::cli::validation))]
    ValidationFailed { errors: usize, warnings: usize },

    #[error("Render error: {message}")]
    #[diagnostic(code(crdform::cli::render))]
    Render { message: String },

    #[error("Definition error: {message}")]
    #[diagnostic(code(crdform::cli::definition))]
    Definition {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(crdform::cli::error))]
    Other { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } | CliError::ValidationFailed { .. } => {
                exit_codes::VALIDATION_ERROR
            }
            CliError::Render { .. } => exit_codes::RENDER_ERROR,
            CliError::Definition { .. } => exit_codes::DEFINITION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
            help: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => e.into(),
            CoreError::ConfigMerge { message } => CliError::validation(message),
            CoreError::YamlParse(e) => CliError::validation(format!("invalid YAML: {e}")),
            CoreError::JsonParse(e) => CliError::validation(format!("invalid JSON: {e}")),
            other => CliError::definition(other.to_string()),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation {
                resource,
                diagnostics,
            } => CliError::Validation {
                message: format!("configuration of {resource} is invalid"),
                help: Some(diagnostics.to_string().trim_end().to_string()),
            },
            EngineError::Marshal(e) => CliError::Render {
                message: e.to_string(),
            },
            e @ EngineError::Decode { .. } => CliError::Render {
                message: e.to_string(),
            },
            EngineError::UnknownResource { name, suggestion } => CliError::Definition {
                message: format!("unknown resource type '{name}'"),
                help: suggestion,
            },
            e @ EngineError::DuplicateResource { .. } => CliError::definition(e.to_string()),
            EngineError::Definition(e) => e.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::validation("x").exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(
            CliError::ValidationFailed {
                errors: 1,
                warnings: 0
            }
            .exit_code(),
            exit_codes::VALIDATION_ERROR
        );
        assert_eq!(CliError::definition("x").exit_code(), exit_codes::DEFINITION_ERROR);
        assert_eq!(CliError::other("x").exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_from_engine_error() {
        let err: CliError = EngineError::UnknownResource {
            name: "k8s_widget".to_string(),
            suggestion: Some("Did you mean `k8s_example_com_widget_v1`?".to_string()),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::DEFINITION_ERROR);
        match err {
            CliError::Definition { help, .. } => assert!(help.unwrap().contains("widget_v1")),
            other => panic!("unexpected error: {other}"),
        }

        let err: CliError = EngineError::decode("spec.size", "expected integer, got string").into();
        assert_eq!(err.exit_code(), exit_codes::RENDER_ERROR);
    }

    #[test]
    fn test_from_core_io_error() {
        let err: CliError = CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ))
        .into();
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
    }
}
