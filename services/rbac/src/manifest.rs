//! Versioned route manifest: the explicit route inventory
//!
//! Instead of introspecting a live router, the synchronizer consumes a
//! generated JSON artifact listing every registered endpoint. The manifest
//! carries a format version so stale artifacts fail loudly instead of
//! silently desyncing permissions.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RbacError;

/// Manifest format version this build understands
pub const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// One registered endpoint: a URI template with its methods and optional name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub uri: String,
    pub methods: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The full route inventory of the application being guarded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteManifest {
    pub version: u32,
    #[serde(default)]
    pub generated_at: Option<String>,
    pub routes: Vec<RouteEntry>,
}

/// A single `(uri, method, name)` record yielded during iteration
#[derive(Debug, Clone)]
pub struct RouteRecord<'a> {
    pub uri: &'a str,
    pub method: &'a str,
    pub name: Option<&'a str>,
}

impl RouteManifest {
    /// Parse a manifest from a JSON string, rejecting unsupported versions
    pub fn from_json_str(json: &str) -> Result<Self, RbacError> {
        let manifest: RouteManifest = serde_json::from_str(json)
            .map_err(|e| RbacError::Manifest(format!("invalid manifest JSON: {}", e)))?;

        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            return Err(RbacError::Manifest(format!(
                "unsupported manifest version {} (expected {})",
                manifest.version, SUPPORTED_MANIFEST_VERSION
            )));
        }

        Ok(manifest)
    }

    /// Load a manifest from a file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RbacError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RbacError::Manifest(format!("cannot read manifest {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&json)
    }

    /// Iterate one record per `(uri, method)` pair
    pub fn records(&self) -> impl Iterator<Item = RouteRecord<'_>> {
        self.routes.iter().flat_map(|route| {
            route.methods.iter().map(move |method| RouteRecord {
                uri: &route.uri,
                method,
                name: route.name.as_deref(),
            })
        })
    }
}
