//! Catalog of named datasets published by a datapackage manifest

use ct_core::Transport;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::DataError;

#[derive(Debug, Deserialize)]
struct Manifest {
    resources: Vec<ManifestResource>,
}

#[derive(Debug, Deserialize)]
struct ManifestResource {
    name: String,
    path: String,
}

/// Immutable name → fetch path mapping taken from one manifest fetch
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    entries: IndexMap<String, String>,
}

impl ResourceCatalog {
    /// Fetch the manifest once and index its resources
    pub async fn load(transport: &dyn Transport, manifest_url: &str) -> Result<Self, DataError> {
        info!("Loading resource catalog from {}", manifest_url);

        let payload = transport
            .get(manifest_url)
            .await
            .map_err(|source| DataError::Fetch {
                url: manifest_url.to_string(),
                source,
            })?;

        let catalog = Self::from_manifest(manifest_url, &payload.body)?;
        info!("Catalog lists {} resources", catalog.len());
        Ok(catalog)
    }

    /// Index a manifest body.
    ///
    /// Resources are read in order; a repeated name replaces the earlier path.
    pub fn from_manifest(manifest_url: &str, body: &[u8]) -> Result<Self, DataError> {
        let manifest: Manifest = serde_json::from_slice(body)
            .map_err(|e| DataError::decode(manifest_url, format!("invalid manifest: {}", e)))?;

        let mut entries = IndexMap::with_capacity(manifest.resources.len());
        for resource in manifest.resources {
            if let Some(previous) = entries.insert(resource.name.clone(), resource.path) {
                debug!("Resource '{}' listed again, replacing {}", resource.name, previous);
            }
        }

        Ok(Self { entries })
    }

    /// Fetch path for a resource name
    pub fn resolve(&self, name: &str) -> Result<&str, DataError> {
        self.get(name)
            .ok_or_else(|| DataError::UnknownResource(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Resource names in manifest order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
