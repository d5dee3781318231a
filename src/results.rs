//! Results sink.
//!
//! Functions may emit diagnostics in the `results` section of their
//! output envelope, orthogonal to item mutation. The sink keeps them
//! available in memory and optionally persists them to a caller-chosen
//! file as a bare YAML sequence.

use crate::document::Document;
use crate::error::{Error, Result};
use serde_yaml::Value;
use std::io::Write;
use std::path::Path;

/// Renders a results sequence as YAML. The output is the sequence
/// itself, not wrapped in a document.
pub(crate) fn results_yaml(results: &[Document]) -> Result<String> {
    let seq: Vec<&Value> = results.iter().map(Document::value).collect();
    Ok(serde_yaml::to_string(&seq)?)
}

/// Writes the results sequence to the given path.
///
/// Open and write failures carry the configured path; the caller treats
/// them as superseding the function's own exit status.
pub(crate) fn write_results_file(path: &Path, results: &[Document]) -> Result<()> {
    let text = results_yaml(results)?;
    let mut file = std::fs::File::create(path).map_err(|source| Error::ResultsFile {
        path: path.display().to_string(),
        source,
    })?;
    file.write_all(text.as_bytes())
        .map_err(|source| Error::ResultsFile {
            path: path.display().to_string(),
            source,
        })?;
    Ok(())
}
