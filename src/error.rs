//! Error types for the function runner.

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a configuration function.
///
/// When several apply to one invocation, the runner surfaces them in this
/// order: results-file failures first, then the function's exit status,
/// then envelope decoding, then spec and I/O problems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured results file could not be created or written.
    /// Supersedes a non-zero exit from the function.
    #[error("open {path}: {source}")]
    ResultsFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The function ran to completion with a non-zero exit status.
    /// Any results it emitted remain available on the filter.
    #[error("exit status {code}")]
    FunctionExit { code: i32 },

    /// The function's output could not be decoded as a resource list.
    #[error("function output is not a resource list: {reason}")]
    Envelope { reason: String },

    /// A required field in the function spec is missing or malformed.
    #[error("invalid function spec: {reason}")]
    Spec { reason: String },

    /// A document is not the expected tree shape.
    #[error("invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// YAML parse or serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Underlying I/O failure writing stdin or reading stdout.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
