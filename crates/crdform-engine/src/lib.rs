//! crdform Engine - manifest rendering and resource lifecycle
//!
//! This crate turns resource definitions into servable resource types:
//! - `Manifest`: the rendered Kubernetes object and its YAML encoding
//! - `Resource`: Create/Read/Update/Delete handlers a host drives
//! - `Provider`: registration table of every resource type
//! - `Diagnostics`: host-facing problem reports

pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod manifest;
pub mod provider;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{EngineError, Result};
pub use lifecycle::{
    Clock, ManifestResource, Resource, ResourceMetadata, ResourceState, SystemClock,
};
pub use manifest::{Manifest, MetadataConfig};
pub use provider::{DEFAULT_PREFIX, Provider, ProviderBuilder, builtin_definitions};
