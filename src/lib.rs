//! # fnrun
//!
//! **Configuration-Function Runner**
//!
//! This crate treats a containerized program as a pure transform over a
//! bundle of structured configuration documents. Given a set of input
//! documents and a function config naming a container image, the runner
//! packages the inputs into a ResourceList envelope, executes the
//! container under a constrained sandbox, parses the output envelope,
//! and merges results and diagnostics back into the document stream.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       FunctionFilter                         │
//! │                                                              │
//! │  documents ─► Scope ─► Envelope ─► FunctionRuntime ─► merge  │
//! │                (dir      (encode/     (docker CLI or          │
//! │                 based)    decode)      direct exec)           │
//! │                                          │                   │
//! │                                 results ─┴─► results file    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Wire Contract
//!
//! A function reads a `ResourceList` on stdin and writes one on stdout:
//! `items` carries the documents in scope, `functionConfig` the config
//! document, and the output's optional `results` carries diagnostics.
//! Functions may instead emit a bare multi-document stream, which is
//! taken as the items of a generator.
//!
//! # Security Model
//!
//! Container functions run with `--rm`, as `nobody`, with
//! `no-new-privileges`, no network by default, and read-only mounts.
//! Environment variables are forwarded by name only, so values never
//! appear in argv.
//!
//! # Example
//!
//! ```rust,ignore
//! use fnrun::{ByteReader, ByteWriter, Document, FunctionFilter};
//!
//! #[tokio::main]
//! async fn main() -> fnrun::Result<()> {
//!     let config = Document::parse("apiVersion: v1\nkind: MyFunction\nmetadata:\n  name: fn\n")?;
//!     let mut filter = FunctionFilter {
//!         image: "example.com/my-fn:v1.0.0".to_string(),
//!         config: Some(config),
//!         ..Default::default()
//!     };
//!
//!     let input = ByteReader::new(std::io::stdin()).read()?;
//!     let output = filter.filter(input).await?;
//!     ByteWriter::new(std::io::stdout()).write(&output)?;
//!     Ok(())
//! }
//! ```

// =============================================================================
// Modules
// =============================================================================

pub mod constants;
pub mod document;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod runtime;
pub mod scope;
pub mod spec;
pub mod stream;

mod paths;
mod results;

// =============================================================================
// Re-exports
// =============================================================================

pub use document::Document;
pub use error::{Error, Result};
pub use filter::FunctionFilter;
pub use runtime::{DockerRuntime, ExecRuntime, FunctionRuntime, RunOutput};
pub use spec::{get_function_spec, ContainerSpec, FunctionSpec, NetworkSpec, StorageMount};
pub use stream::{ByteReader, ByteWriter};
