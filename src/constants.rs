//! Constants for the function runner.
//!
//! All annotation keys, wire-format identifiers, and limits are defined
//! here to ensure consistency and prevent magic strings throughout the
//! codebase.

// =============================================================================
// Annotation Keys
// =============================================================================

/// Annotation naming the file a document originates from or should be
/// written to, as a relative slash-separated path.
pub const PATH_ANNOTATION: &str = "config.kubernetes.io/path";

/// Transient annotation carrying a document's zero-based ordinal within
/// the input sequence. Assigned before invocation, stripped on final
/// output unless the caller keeps reader annotations.
pub const INDEX_ANNOTATION: &str = "config.kubernetes.io/index";

/// Annotation carrying an inline function spec as a literal YAML block.
pub const FUNCTION_ANNOTATION: &str = "config.kubernetes.io/function";

/// Legacy metadata field carrying an inline function spec subtree.
pub const LEGACY_FUNCTION_FIELD: &str = "configFn";

// =============================================================================
// Wire Format
// =============================================================================

/// `apiVersion` of the ResourceList envelope.
pub const RESOURCE_LIST_API_VERSION: &str = "config.kubernetes.io/v1alpha1";

/// `kind` of the ResourceList envelope.
pub const RESOURCE_LIST_KIND: &str = "ResourceList";

// =============================================================================
// Scoping
// =============================================================================

/// Conventional directory name for functions scoped to their parent
/// directory rather than their own.
pub const FUNCTIONS_DIR: &str = "functions";

// =============================================================================
// Container Runtime
// =============================================================================

/// Network passed to the container runtime when the function does not
/// request network access.
pub const DEFAULT_NETWORK: &str = "none";

/// User the function container runs as.
pub const CONTAINER_USER: &str = "nobody";

// =============================================================================
// Size Limits
// =============================================================================

/// Maximum size of a function's output envelope (64 MiB).
/// Prevents memory exhaustion from a runaway function.
pub const MAX_FUNCTION_OUTPUT_SIZE: usize = 64 * 1024 * 1024;
