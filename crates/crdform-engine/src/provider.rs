//! Provider: the registration table of resource types

use crdform_core::ResourceDefinition;
use crdform_core::suggestions::suggest_resource;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::lifecycle::{Clock, ManifestResource, Resource, ResourceMetadata, SystemClock};

/// Default prefix of resource type names
pub const DEFAULT_PREFIX: &str = "k8s";

/// Definitions compiled into the binary
const BUILTIN_DEFINITIONS: &[(&str, &str)] = &[
    (
        "cert-manager-certificate.yaml",
        include_str!("../definitions/cert-manager-certificate.yaml"),
    ),
    (
        "cert-manager-cluster-issuer.yaml",
        include_str!("../definitions/cert-manager-cluster-issuer.yaml"),
    ),
    (
        "monitoring-service-monitor.yaml",
        include_str!("../definitions/monitoring-service-monitor.yaml"),
    ),
    (
        "argocd-application.yaml",
        include_str!("../definitions/argocd-application.yaml"),
    ),
];

/// Parse the compiled-in definitions
pub fn builtin_definitions() -> Result<Vec<ResourceDefinition>> {
    let mut definitions = Vec::new();
    for (name, content) in BUILTIN_DEFINITIONS {
        tracing::trace!(file = name, "loading builtin definition");
        definitions.extend(ResourceDefinition::from_yaml(content)?);
    }
    Ok(definitions)
}

pub struct ProviderBuilder {
    prefix: String,
    builtin: bool,
    definitions: Vec<ResourceDefinition>,
    definition_paths: Vec<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            builtin: true,
            definitions: Vec::new(),
            definition_paths: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Prefix of derived type names
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Register the compiled-in definitions (on by default)
    pub fn builtin(mut self, enabled: bool) -> Self {
        self.builtin = enabled;
        self
    }

    pub fn definition(mut self, definition: ResourceDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Load definitions from a file or directory at build time
    pub fn definitions_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.definition_paths.push(path.into());
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<Provider> {
        let mut all = Vec::new();
        if self.builtin {
            all.extend(builtin_definitions()?);
        }
        for path in &self.definition_paths {
            all.extend(ResourceDefinition::load_dir(path)?);
        }
        all.extend(self.definitions);

        let mut resources: IndexMap<String, Arc<ManifestResource>> = IndexMap::new();
        for definition in all {
            let resource = ManifestResource::new(definition, &self.prefix, Arc::clone(&self.clock))?;
            let name = resource.type_name().to_string();
            if resources.contains_key(&name) {
                return Err(EngineError::DuplicateResource { name });
            }
            tracing::debug!(resource = %name, "registered resource type");
            resources.insert(name, Arc::new(resource));
        }

        Ok(Provider {
            prefix: self.prefix,
            resources,
        })
    }
}

/// All resource types the provider serves
#[derive(Debug)]
pub struct Provider {
    prefix: String,
    resources: IndexMap<String, Arc<ManifestResource>>,
}

impl Provider {
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Metadata of every registered type, in registration order
    pub fn metadata(&self) -> Vec<&ResourceMetadata> {
        self.resources.values().map(|r| r.metadata()).collect()
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }

    /// Look up a resource type by name
    pub fn resource(&self, name: &str) -> Result<Arc<dyn Resource>> {
        match self.resources.get(name) {
            Some(resource) => Ok(Arc::clone(resource) as Arc<dyn Resource>),
            None => Err(EngineError::UnknownResource {
                name: name.to_string(),
                suggestion: suggest_resource(name, &self.type_names()),
            }),
        }
    }

    pub fn resources(&self) -> impl Iterator<Item = &ManifestResource> {
        self.resources.values().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
