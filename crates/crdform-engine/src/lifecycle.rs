//! Resource lifecycle handlers
//!
//! Create and Update render the manifest and return it as state. Read and
//! Delete never touch anything outside the state the host already holds.

use crdform_core::schema::to_snake_case;
use crdform_core::{DynamicValue, ResourceDefinition, Schema, SchemaValidator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::error::{EngineError, Result};
use crate::manifest::{Manifest, MetadataConfig};

/// Source of resource IDs
pub trait Clock: Send + Sync {
    /// Nanoseconds since the Unix epoch
    fn now_nanos(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        nanos_or_clamped(chrono::Utc::now())
    }
}

/// Nanosecond timestamps only cover the years 1677 to 2262
fn nanos_or_clamped(now: chrono::DateTime<chrono::Utc>) -> i64 {
    now.timestamp_nanos_opt().unwrap_or_else(|| {
        tracing::warn!(%now, "wall clock outside the nanosecond timestamp range, clamping id");
        if now.timestamp() < 0 {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

/// Name and description of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub type_name: String,
    pub api_version: String,
    pub kind: String,
    pub namespaced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything the host stores for one resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: i64,
    pub yaml: String,
    pub api_version: String,
    pub kind: String,
    pub metadata: MetadataConfig,
    /// Payload as configured, keyed by configuration names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DynamicValue>,
}

/// Lifecycle interface a host drives
pub trait Resource: fmt::Debug + Send + Sync {
    fn metadata(&self) -> &ResourceMetadata;

    fn schema(&self) -> &Schema;

    /// Check a configuration without producing state
    fn validate(&self, config: &DynamicValue) -> Diagnostics;

    fn create(&self, config: &DynamicValue) -> Result<ResourceState>;

    fn read(&self, state: ResourceState) -> Result<ResourceState>;

    fn update(&self, prior: &ResourceState, config: &DynamicValue) -> Result<ResourceState>;

    fn delete(&self, state: &ResourceState) -> Result<()>;
}

/// The resource implementation shared by every definition
pub struct ManifestResource {
    metadata: ResourceMetadata,
    definition: ResourceDefinition,
    validator: SchemaValidator,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ManifestResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestResource")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ManifestResource {
    pub fn new(definition: ResourceDefinition, prefix: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        definition.validate()?;
        let validator = SchemaValidator::new(definition.schema())?;
        let metadata = ResourceMetadata {
            type_name: definition.type_name(prefix),
            api_version: definition.api_version.clone(),
            kind: definition.kind.clone(),
            namespaced: definition.namespaced,
            description: definition.description.clone(),
        };

        Ok(Self {
            metadata,
            definition,
            validator,
            clock,
        })
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn type_name(&self) -> &str {
        &self.metadata.type_name
    }

    /// Validate, decode and render; shared by Create and Update
    fn render(&self, config: &DynamicValue, id: i64) -> Result<ResourceState> {
        let diagnostics = self.validate(config);
        for warning in diagnostics.warnings() {
            tracing::warn!(resource = %self.type_name(), "{}", warning);
        }
        if diagnostics.has_errors() {
            return Err(EngineError::Validation {
                resource: self.type_name().to_string(),
                diagnostics,
            });
        }

        // Typed attributes drop nulls while converting; dynamic subtrees keep them
        let manifest = Manifest::from_config(&self.definition, config)?;
        tracing::debug!(resource = %self.type_name(), "decoded configuration");

        let yaml = manifest.to_yaml()?;
        let metadata = config
            .get("metadata")
            .map(MetadataConfig::from_config)
            .transpose()?
            .unwrap_or_default();
        let payload = config
            .get(&to_snake_case(&self.definition.payload))
            .filter(|v| !v.is_null())
            .cloned();

        tracing::info!(
            resource = %self.type_name(),
            name = %metadata.name,
            id,
            "rendered manifest"
        );

        Ok(ResourceState {
            id,
            yaml,
            api_version: manifest.api_version,
            kind: manifest.kind,
            metadata,
            payload,
        })
    }
}

impl Resource for ManifestResource {
    fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    fn schema(&self) -> &Schema {
        self.validator.schema()
    }

    fn validate(&self, config: &DynamicValue) -> Diagnostics {
        self.validator.validate(config).errors.iter().collect()
    }

    fn create(&self, config: &DynamicValue) -> Result<ResourceState> {
        tracing::debug!(resource = %self.type_name(), "create");
        self.render(config, self.clock.now_nanos())
    }

    fn read(&self, state: ResourceState) -> Result<ResourceState> {
        tracing::debug!(resource = %self.type_name(), id = state.id, "read");
        Ok(state)
    }

    fn update(&self, prior: &ResourceState, config: &DynamicValue) -> Result<ResourceState> {
        tracing::debug!(resource = %self.type_name(), prior_id = prior.id, "update");
        // The clock may not have advanced (or may have gone back) since Create
        let id = self.clock.now_nanos().max(prior.id.saturating_add(1));
        self.render(config, id)
    }

    fn delete(&self, state: &ResourceState) -> Result<()> {
        tracing::debug!(resource = %self.type_name(), id = state.id, "delete");
        Ok(())
    }
}
