//! crdform Core - Core types for rendering Kubernetes custom resources
//!
//! This crate provides the foundational types used throughout crdform:
//! - `DynamicValue`: Untyped YAML/JSON tree with round-trip fidelity
//! - `IntOrString`: Kubernetes' polymorphic int-or-string scalar
//! - `validation`: Kubernetes name, label, annotation and base64 checks
//! - `Schema`: Typed attribute trees and their validator
//! - `ResourceDefinition`: Data-driven description of one CRD version
//! - `ResourceConfig`: User configuration with deep merge support

pub mod config;
pub mod crd;
pub mod definition;
pub mod dynamic;
pub mod error;
pub mod int_or_string;
pub mod schema;
pub mod suggestions;
pub mod validation;

pub use config::{ResourceConfig, parse_set_values};
pub use crd::CrdImporter;
pub use definition::{ResourceDefinition, SCHEMA_VERSION};
pub use dynamic::DynamicValue;
pub use error::{CoreError, Severity, ValidationErrorInfo};
pub use int_or_string::IntOrString;
pub use schema::{Attribute, AttributeType, Schema, SchemaValidator, ValidationResult};
pub use validation::Format;
