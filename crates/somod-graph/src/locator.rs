//! Node-style package location.
//!
//! Mirrors Node's lookup for bare specifiers: try `<dir>/node_modules/<name>`
//! for the starting directory, then each parent, stopping at the first
//! directory whose `package.json` exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ModuleError, Result};
use crate::package_json::MANIFEST_FILE;
use crate::runtime::Runtime;

const NODE_MODULES: &str = "node_modules";

/// Resolves the install directory of a package by name.
#[derive(Debug, Clone)]
pub struct PackageLocator {
    runtime: Arc<dyn Runtime>,
}

impl PackageLocator {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }

    /// Locate `name` as seen from `from`.
    ///
    /// # Errors
    ///
    /// [`ModuleError::ModuleNotFound`] when no `node_modules/<name>` with a
    /// manifest exists between `from` and the filesystem root, or when the
    /// name cannot be a package name at all.
    pub fn locate(&self, from: &Path, name: &str) -> Result<PathBuf> {
        let not_found = || ModuleError::ModuleNotFound {
            name: name.to_string(),
            from: from.to_path_buf(),
        };

        let relative = package_subpath(name).ok_or_else(not_found)?;

        for dir in from.ancestors() {
            // `node_modules/node_modules` is never a lookup location
            if dir.file_name().is_some_and(|n| n == NODE_MODULES) {
                continue;
            }

            let candidate = dir.join(NODE_MODULES).join(&relative);
            tracing::trace!(package = name, candidate = %candidate.display(), "probing");

            if self.runtime.exists(&candidate.join(MANIFEST_FILE)) {
                return Ok(candidate);
            }
        }

        Err(not_found())
    }
}

/// Turn `@scope/name` or `name` into a relative path, rejecting anything
/// that could escape `node_modules`.
fn package_subpath(name: &str) -> Option<PathBuf> {
    let parts: Vec<&str> = name.split('/').collect();

    let well_formed = match parts.as_slice() {
        [single] => !single.starts_with('@'),
        [scope, _] => scope.len() > 1 && scope.starts_with('@'),
        _ => false,
    };

    let safe = parts
        .iter()
        .all(|part| !part.is_empty() && *part != "." && *part != ".." && !part.contains('\\'));

    (well_formed && safe).then(|| parts.iter().collect())
}
