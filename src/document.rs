//! Document tree wrapper.
//!
//! A [`Document`] is a Kubernetes-shaped configuration record: a YAML
//! mapping with a recognizable `apiVersion`, `kind`, and `metadata`
//! subtree. Documents are mutated in place; annotation edits preserve
//! the mapping order of untouched keys.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// One structured configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Parses a single document from YAML text.
    ///
    /// # Errors
    ///
    /// Fails when the text is not valid YAML or the root is not a mapping.
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        Self::from_value(root)
    }

    /// Wraps an already-parsed YAML value.
    pub fn from_value(root: Value) -> Result<Self> {
        if !root.is_mapping() {
            return Err(Error::InvalidDocument {
                reason: "document root must be a mapping".to_string(),
            });
        }
        Ok(Self { root })
    }

    /// Serializes the document back to YAML text.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    /// Borrows the underlying YAML tree.
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Consumes the document, returning the underlying YAML tree.
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Returns a top-level field of the document.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Returns the document's `apiVersion`.
    pub fn api_version(&self) -> Option<&str> {
        self.root.get("apiVersion")?.as_str()
    }

    /// Returns the document's `kind`.
    pub fn kind(&self) -> Option<&str> {
        self.root.get("kind")?.as_str()
    }

    /// Returns `metadata.name`.
    pub fn name(&self) -> Option<&str> {
        self.root.get("metadata")?.get("name")?.as_str()
    }

    /// Returns the value of an annotation, if present.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.root
            .get("metadata")?
            .get("annotations")?
            .get(key)?
            .as_str()
    }

    /// Sets an annotation, creating `metadata.annotations` as needed.
    ///
    /// Existing annotations keep their position; a new key is appended.
    pub fn set_annotation(&mut self, key: &str, value: impl Into<String>) {
        {
            let Some(root) = self.root.as_mapping_mut() else {
                return;
            };
            if !contains(root, "metadata") {
                root.insert(Value::from("metadata"), Value::Mapping(Mapping::new()));
            }
        }
        {
            let Some(meta) = self.root.get_mut("metadata").and_then(Value::as_mapping_mut)
            else {
                return;
            };
            if !contains(meta, "annotations") {
                meta.insert(Value::from("annotations"), Value::Mapping(Mapping::new()));
            }
        }
        let Some(annotations) = self
            .root
            .get_mut("metadata")
            .and_then(|meta| meta.get_mut("annotations"))
            .and_then(Value::as_mapping_mut)
        else {
            return;
        };
        annotations.insert(Value::from(key), Value::String(value.into()));
    }

    /// Removes an annotation. An emptied `annotations` mapping is removed
    /// from `metadata` so stripped documents round-trip to their original
    /// form.
    pub fn remove_annotation(&mut self, key: &str) {
        let emptied = {
            let Some(annotations) = self
                .root
                .get_mut("metadata")
                .and_then(|meta| meta.get_mut("annotations"))
                .and_then(Value::as_mapping_mut)
            else {
                return;
            };
            if !contains(annotations, key) {
                return;
            }
            // Rebuild rather than remove to keep the order of remaining keys.
            let remaining: Mapping = std::mem::take(annotations)
                .into_iter()
                .filter(|(k, _)| k.as_str() != Some(key))
                .collect();
            let emptied = remaining.is_empty();
            *annotations = remaining;
            emptied
        };
        if emptied {
            let Some(meta) = self.root.get_mut("metadata").and_then(Value::as_mapping_mut)
            else {
                return;
            };
            let cleaned: Mapping = std::mem::take(meta)
                .into_iter()
                .filter(|(k, _)| k.as_str() != Some("annotations"))
                .collect();
            *meta = cleaned;
        }
    }
}

fn contains(map: &Mapping, key: &str) -> bool {
    map.iter().any(|(k, _)| k.as_str() == Some(key))
}

/// Parses a multi-document YAML stream, skipping empty documents.
pub(crate) fn parse_documents(text: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for de in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(de)?;
        if value.is_null() {
            continue;
        }
        documents.push(Document::from_value(value)?);
    }
    Ok(documents)
}
