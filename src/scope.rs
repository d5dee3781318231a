//! Document scoping.
//!
//! A function only sees the documents living under its own directory.
//! The scope is derived from the function config's path annotation; a
//! config without one, or one sitting at the tree root, sees everything.

use crate::constants::PATH_ANNOTATION;
use crate::document::Document;
use crate::paths;

/// The set of documents a function is permitted to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every document is in scope.
    Global,
    /// Documents under this directory are in scope.
    Dir(String),
}

/// Derives the scope of a function config from its path annotation.
///
/// The scope directory is the config's directory with a trailing
/// `functions` segment stripped. A missing path annotation or a root
/// directory yields [`Scope::Global`].
pub fn function_scope(config: Option<&Document>) -> Scope {
    match paths::config_scope_dir(config) {
        Some(dir) => Scope::Dir(dir),
        None => Scope::Global,
    }
}

/// Partitions candidates into `(in_scope, out_of_scope)`, preserving the
/// original order within each bucket.
///
/// A candidate is in scope when its path annotation's directory equals
/// the scope directory or descends from it. Candidates living under a
/// `functions/` subdirectory are judged by that directory's parent, so
/// sibling functions share their parent's scope. A candidate without a
/// path annotation is out of scope unless the scope is global.
pub fn partition(scope: &Scope, documents: Vec<Document>) -> (Vec<Document>, Vec<Document>) {
    let dir = match scope {
        Scope::Global => return (documents, Vec::new()),
        Scope::Dir(dir) => dir.as_str(),
    };

    let mut in_scope = Vec::new();
    let mut out_of_scope = Vec::new();
    for doc in documents {
        let Some(path) = doc.annotation(PATH_ANNOTATION) else {
            out_of_scope.push(doc);
            continue;
        };
        let candidate_dir = paths::strip_functions_dir(paths::parent(path));
        if in_dir(candidate_dir, dir) {
            in_scope.push(doc);
        } else {
            out_of_scope.push(doc);
        }
    }
    (in_scope, out_of_scope)
}

/// True when `candidate` equals `dir` or descends from it at a path
/// segment boundary, so `foo` does not capture `foobar`.
fn in_dir(candidate: &str, dir: &str) -> bool {
    candidate == dir || candidate.starts_with(&format!("{dir}/"))
}
