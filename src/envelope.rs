//! ResourceList envelope codec.
//!
//! The wire format between the runner and a function is a single YAML
//! document:
//!
//! ```yaml
//! apiVersion: config.kubernetes.io/v1alpha1
//! kind: ResourceList
//! items: []          # documents visible to the function
//! functionConfig: {} # the function config document
//! results: []        # (output only) diagnostics
//! ```
//!
//! Functions may also emit a bare multi-document stream instead of a
//! wrapped list; the documents are then taken as the items.

use crate::constants::{
    INDEX_ANNOTATION, MAX_FUNCTION_OUTPUT_SIZE, RESOURCE_LIST_API_VERSION, RESOURCE_LIST_KIND,
};
use crate::document::{parse_documents, Document};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};

/// Items and diagnostics decoded from a function's output envelope.
#[derive(Debug, Default)]
pub struct DecodedList {
    /// The returned document sequence. The function may have reordered,
    /// mutated, added, or removed items.
    pub items: Vec<Document>,
    /// Optional diagnostics, orthogonal to item mutation.
    pub results: Vec<Document>,
}

/// Serializes in-scope items and the function config into the input
/// envelope.
///
/// With `flow_config` set, the `functionConfig` subtree is rendered in
/// flow (single-line) style, which keeps the wire format diff-friendly
/// when the config has deep metadata.
pub fn encode(items: &[Document], config: Option<&Document>, flow_config: bool) -> Result<String> {
    let mut root = Mapping::new();
    root.insert(Value::from("apiVersion"), Value::from(RESOURCE_LIST_API_VERSION));
    root.insert(Value::from("kind"), Value::from(RESOURCE_LIST_KIND));
    root.insert(
        Value::from("items"),
        Value::Sequence(items.iter().map(|doc| doc.value().clone()).collect()),
    );
    match config {
        Some(config) if flow_config => {
            let mut text = serde_yaml::to_string(&Value::Mapping(root))?;
            text.push_str("functionConfig: ");
            text.push_str(&flow_style(config.value()));
            text.push('\n');
            Ok(text)
        }
        Some(config) => {
            root.insert(Value::from("functionConfig"), config.value().clone());
            Ok(serde_yaml::to_string(&Value::Mapping(root))?)
        }
        None => Ok(serde_yaml::to_string(&Value::Mapping(root))?),
    }
}

/// Decodes a function's output.
///
/// A single document of kind `ResourceList` is unwrapped into items and
/// results, annotations untouched and unknown top-level keys ignored. A
/// bare stream of documents becomes the items directly, each stamped
/// with its stream position, with no results.
pub fn decode(text: &str) -> Result<DecodedList> {
    if text.len() > MAX_FUNCTION_OUTPUT_SIZE {
        return Err(Error::Envelope {
            reason: format!(
                "output size {} exceeds limit of {}",
                text.len(),
                MAX_FUNCTION_OUTPUT_SIZE
            ),
        });
    }
    let mut documents = parse_documents(text).map_err(|e| Error::Envelope {
        reason: e.to_string(),
    })?;

    if documents.len() == 1 && documents[0].kind() == Some(RESOURCE_LIST_KIND) {
        let root = documents.remove(0).into_value();
        return Ok(DecodedList {
            items: document_sequence(root.get("items"))?,
            results: document_sequence(root.get("results"))?,
        });
    }

    for (i, doc) in documents.iter_mut().enumerate() {
        doc.set_annotation(INDEX_ANNOTATION, i.to_string());
    }
    Ok(DecodedList {
        items: documents,
        results: Vec::new(),
    })
}

fn document_sequence(value: Option<&Value>) -> Result<Vec<Document>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let Some(seq) = value.as_sequence() else {
        return Err(Error::Envelope {
            reason: "items and results must be sequences".to_string(),
        });
    };
    seq.iter()
        .map(|item| {
            Document::from_value(item.clone()).map_err(|e| Error::Envelope {
                reason: e.to_string(),
            })
        })
        .collect()
}

// =============================================================================
// Flow-style Rendering
// =============================================================================

/// Renders a YAML value in flow (single-line) style.
fn flow_style(value: &Value) -> String {
    let mut out = String::new();
    flow_value(value, &mut out);
    out
}

fn flow_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => flow_scalar(s, out),
        Value::Sequence(seq) => {
            out.push('[');
            for (i, item) in seq.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                flow_value(item, out);
            }
            out.push(']');
        }
        Value::Mapping(map) => {
            out.push('{');
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                flow_value(key, out);
                out.push_str(": ");
                flow_value(val, out);
            }
            out.push('}');
        }
        Value::Tagged(tagged) => flow_value(&tagged.value, out),
    }
}

fn flow_scalar(s: &str, out: &mut String) {
    if is_plain(s) {
        out.push_str(s);
    } else {
        out.push('\'');
        out.push_str(&s.replace('\'', "''"));
        out.push('\'');
    }
}

/// Conservatively decides whether a scalar can be emitted without
/// quotes in flow context.
fn is_plain(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
        && !matches!(
            s,
            "true" | "false" | "null" | "~" | "yes" | "no" | "on" | "off" | "True" | "False"
                | "Null" | "Yes" | "No" | "On" | "Off"
        )
        && s.parse::<f64>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_style_nested_mapping() {
        let value: Value =
            serde_yaml::from_str("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: foo\n")
                .unwrap();
        assert_eq!(
            flow_style(&value),
            "{apiVersion: apps/v1, kind: Deployment, metadata: {name: foo}}"
        );
    }

    #[test]
    fn test_flow_style_quotes_ambiguous_scalars() {
        let value: Value = serde_yaml::from_str("a: '0'\nb: 'yes'\nc: a b\n").unwrap();
        assert_eq!(flow_style(&value), "{a: '0', b: 'yes', c: 'a b'}");
    }

    #[test]
    fn test_flow_style_sequence() {
        let value: Value = serde_yaml::from_str("items:\n- one\n- 2\n").unwrap();
        assert_eq!(flow_style(&value), "{items: [one, 2]}");
    }
}
