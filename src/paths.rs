//! Path annotation arithmetic.
//!
//! Documents are addressed by relative, slash-separated paths carried in
//! the path annotation. These helpers stay in string space on purpose:
//! the annotation is a wire value, not a host filesystem path.

use crate::constants::{FUNCTIONS_DIR, PATH_ANNOTATION};
use crate::document::Document;

/// Returns the directory component of a slash path, `""` for a bare
/// file name.
pub(crate) fn parent(path: &str) -> &str {
    let path = path.trim_start_matches("./");
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Returns the last segment of a slash path.
pub(crate) fn base(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Strips a trailing `functions` segment from a directory, once.
///
/// Functions living under a conventional `functions/` subdirectory are
/// addressed by the parent directory containing it.
pub(crate) fn strip_functions_dir(dir: &str) -> &str {
    if base(dir) == FUNCTIONS_DIR {
        parent(dir)
    } else {
        dir
    }
}

/// Returns the directory a function config is scoped to: the directory
/// of its path annotation with a trailing `functions` segment stripped.
/// `None` when the config has no path annotation or sits at the tree
/// root.
pub(crate) fn config_scope_dir(config: Option<&Document>) -> Option<String> {
    let path = config?.annotation(PATH_ANNOTATION)?;
    let dir = strip_functions_dir(parent(path));
    if dir.is_empty() || dir == "." {
        None
    } else {
        Some(dir.to_string())
    }
}

/// Computes the default file name for a document: its lowercased kind
/// joined to its name.
pub(crate) fn default_path(kind: &str, name: &str) -> String {
    format!("{}_{}.yaml", kind.to_lowercase(), name)
}

/// Sets a default path annotation on a document that lacks one,
/// prefixed with the given scope directory when present. Documents that
/// already carry a path annotation are left untouched.
pub(crate) fn default_path_annotation(doc: &mut Document, dir: Option<&str>) {
    if doc.annotation(PATH_ANNOTATION).is_some() {
        return;
    }
    let file = default_path(doc.kind().unwrap_or(""), doc.name().unwrap_or(""));
    let path = match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    };
    doc.set_annotation(PATH_ANNOTATION, path);
}
