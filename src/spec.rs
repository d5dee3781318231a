//! Function spec discovery.
//!
//! A document names the function that should process it in one of two
//! places: the `config.kubernetes.io/function` annotation carrying a
//! literal YAML block, or the legacy inline `metadata.configFn` subtree.
//! The annotation form wins; new configs should emit only that form.

use crate::constants::{FUNCTION_ANNOTATION, LEGACY_FUNCTION_FIELD};
use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Spec Types
// =============================================================================

/// Invocation parameters for a configuration function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Container invocation parameters.
    #[serde(default)]
    pub container: ContainerSpec,

    /// Free-form auxiliary fields carried alongside the container spec.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FunctionSpec {
    /// True when the function asks for network access.
    pub fn network_required(&self) -> bool {
        self.container.network.required
    }
}

/// Container parameters of a function spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image to run. Required for a container function.
    #[serde(default)]
    pub image: String,

    /// Network access request.
    #[serde(default, skip_serializing_if = "NetworkSpec::is_disabled")]
    pub network: NetworkSpec,

    /// Storage mounts, all applied read-only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<StorageMount>,
}

/// Network access request of a container function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Whether the function requires network access. Defaults to false.
    #[serde(default)]
    pub required: bool,
}

impl NetworkSpec {
    fn is_disabled(&self) -> bool {
        !self.required
    }
}

/// A read-only storage mount for a function container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMount {
    /// Mount kind: `bind`, `volume`, or `tmpfs`.
    #[serde(rename = "type")]
    pub mount_type: String,

    /// Mount source. Empty for `tmpfs`.
    #[serde(default)]
    pub src: String,

    /// Destination path inside the container.
    pub dst: String,
}

impl StorageMount {
    /// Renders the mount as a container-runtime `--mount` flag value.
    pub fn to_flag(&self) -> String {
        format!("type={},src={},dst={}:ro", self.mount_type, self.src, self.dst)
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Extracts the function spec from a document, or `None` when the
/// document carries no recognizable spec.
///
/// The annotation form is consulted first, then the legacy
/// `metadata.configFn` subtree. Top-level `path` and `network` keys in
/// the parsed spec are reader metadata, not part of the function
/// contract, and are erased; `container.network.required` is retained.
pub fn get_function_spec(doc: &Document) -> Option<FunctionSpec> {
    if let Some(block) = doc.annotation(FUNCTION_ANNOTATION) {
        let spec: FunctionSpec = serde_yaml::from_str(block).ok()?;
        return Some(erase_reader_fields(spec));
    }
    if let Some(subtree) = doc
        .get("metadata")
        .and_then(|meta| meta.get(LEGACY_FUNCTION_FIELD))
    {
        let spec: FunctionSpec = serde_yaml::from_value(subtree.clone()).ok()?;
        return Some(erase_reader_fields(spec));
    }
    None
}

fn erase_reader_fields(mut spec: FunctionSpec) -> FunctionSpec {
    spec.extra.remove("path");
    spec.extra.remove("network");
    spec
}
