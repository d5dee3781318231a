//! Function filter.
//!
//! The orchestrator composing one function invocation end to end:
//!
//! ```text
//! input documents
//!   → scope           (which documents may the function see)
//!   → index           (stamp ordinals for output correlation)
//!   → encode          (build the input envelope)
//!   → run             (container or direct exec, piped stdio)
//!   → decode          (parse the output envelope)
//!   → results sink    (expose and optionally persist diagnostics)
//!   → path defaulting (name items the function left unnamed)
//!   → merge           (reunite with out-of-scope documents)
//! ```
//!
//! One call runs one function and blocks until its exit status is
//! known. Nothing is shared across invocations.

use crate::constants::INDEX_ANNOTATION;
use crate::document::Document;
use crate::envelope;
use crate::error::{Error, Result};
use crate::paths;
use crate::results;
use crate::runtime::{DockerRuntime, FunctionRuntime};
use crate::scope::{function_scope, partition, Scope};
use crate::spec::{get_function_spec, StorageMount};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Runs a single configuration function over a document sequence.
///
/// Fields are plain options; construct with [`Default`] and set what
/// the invocation needs, or derive the container parameters from a
/// config document with [`FunctionFilter::from_config`].
pub struct FunctionFilter {
    /// Container image to run. Ignored when `runtime` is set.
    pub image: String,

    /// The function config document: passed to the function in the
    /// envelope, and the root whose path annotation determines scope.
    pub config: Option<Document>,

    /// Network to attach to the container. `None` leaves it isolated.
    pub network: Option<String>,

    /// Read-only storage mounts for the container.
    pub storage_mounts: Vec<StorageMount>,

    /// Place every input document in scope regardless of paths.
    pub global_scope: bool,

    /// When set, results are also serialized to this file. A failure to
    /// write it supersedes the function's own exit error.
    pub results_file: Option<PathBuf>,

    /// Render the envelope's `functionConfig` subtree in flow style.
    pub set_flow_style_for_config: bool,

    /// Results emitted by the most recent invocation.
    pub results: Vec<Document>,

    /// Runtime override. Substituting an [`ExecRuntime`] here exercises
    /// the filter without a container runtime.
    ///
    /// [`ExecRuntime`]: crate::runtime::ExecRuntime
    pub runtime: Option<Box<dyn FunctionRuntime>>,

    /// Observes the exact envelope text written to the function.
    pub check_input: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl std::fmt::Debug for FunctionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionFilter")
            .field("image", &self.image)
            .field("config", &self.config)
            .field("network", &self.network)
            .field("storage_mounts", &self.storage_mounts)
            .field("global_scope", &self.global_scope)
            .field("results_file", &self.results_file)
            .field(
                "set_flow_style_for_config",
                &self.set_flow_style_for_config,
            )
            .field("results", &self.results)
            .field("runtime", &self.runtime.as_ref().map(|_| "<runtime>"))
            .field(
                "check_input",
                &self.check_input.as_ref().map(|_| "<check_input>"),
            )
            .finish()
    }
}

impl Default for FunctionFilter {
    fn default() -> Self {
        Self {
            image: String::new(),
            config: None,
            network: None,
            storage_mounts: Vec::new(),
            global_scope: false,
            results_file: None,
            set_flow_style_for_config: false,
            results: Vec::new(),
            runtime: None,
            check_input: None,
        }
    }
}

impl FunctionFilter {
    /// Builds a filter from a function config document, extracting the
    /// container parameters from its function spec.
    ///
    /// # Errors
    ///
    /// Fails when the document carries no function spec or the spec
    /// names no image.
    pub fn from_config(config: Document) -> Result<Self> {
        let spec = get_function_spec(&config).ok_or_else(|| Error::Spec {
            reason: "document carries no function spec".to_string(),
        })?;
        if spec.container.image.is_empty() {
            return Err(Error::Spec {
                reason: "container image not specified".to_string(),
            });
        }
        Ok(Self {
            image: spec.container.image.clone(),
            storage_mounts: spec.container.mounts.clone(),
            config: Some(config),
            ..Self::default()
        })
    }

    /// Runs the function over `input`, returning the merged output
    /// sequence.
    ///
    /// Out-of-scope documents are never shown to the function and come
    /// back untouched. In-scope documents are replaced by whatever the
    /// function returned, with default path annotations filled in.
    pub async fn filter(&mut self, mut input: Vec<Document>) -> Result<Vec<Document>> {
        // Stamp every input with its ordinal so outputs can be
        // correlated back to input positions.
        for (i, doc) in input.iter_mut().enumerate() {
            doc.set_annotation(INDEX_ANNOTATION, i.to_string());
        }

        let scope = if self.global_scope {
            Scope::Global
        } else {
            function_scope(self.config.as_ref())
        };
        let (in_scope, out_of_scope) = partition(&scope, input);
        debug!(
            in_scope = in_scope.len(),
            out_of_scope = out_of_scope.len(),
            "scoped function input"
        );

        let envelope_text =
            envelope::encode(&in_scope, self.config.as_ref(), self.set_flow_style_for_config)?;
        if let Some(check) = &self.check_input {
            check(&envelope_text);
        }

        let output = match &self.runtime {
            Some(runtime) => runtime.run(envelope_text.into_bytes()).await?,
            None => {
                let docker = DockerRuntime {
                    image: self.image.clone(),
                    network: self.network.clone(),
                    mounts: self.storage_mounts.clone(),
                };
                docker.run(envelope_text.into_bytes()).await?
            }
        };
        if !output.stderr.is_empty() {
            warn!(stderr = %String::from_utf8_lossy(&output.stderr), "function wrote to stderr");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let decoded = match envelope::decode(&stdout) {
            Ok(decoded) => decoded,
            Err(_) if !output.is_success() => {
                return Err(Error::FunctionExit {
                    code: output.exit_code,
                })
            }
            Err(e) => return Err(e),
        };

        self.results = decoded.results;
        if !self.results.is_empty() {
            if let Some(path) = &self.results_file {
                results::write_results_file(path, &self.results)?;
            }
        }
        if !output.is_success() {
            return Err(Error::FunctionExit {
                code: output.exit_code,
            });
        }

        let scope_dir = paths::config_scope_dir(self.config.as_ref());
        let mut items = decoded.items;
        for item in &mut items {
            paths::default_path_annotation(item, scope_dir.as_deref());
        }

        // Merge policy: transformed items first, then the documents the
        // function never saw.
        items.extend(out_of_scope);
        Ok(items)
    }

    /// Renders the most recent invocation's results as YAML, the same
    /// text a configured results file receives.
    pub fn results_yaml(&self) -> Result<String> {
        results::results_yaml(&self.results)
    }
}
