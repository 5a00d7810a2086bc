//! Error types for module graph construction and namespace resolution.

use std::path::PathBuf;

use crate::runtime::RuntimeError;

/// Errors raised while building or querying the module graph.
///
/// Every variant except [`ModuleError::ModuleLookup`] aborts graph
/// construction: there is no partially built graph to fall back to.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// A declared dependency is not installed anywhere up the tree.
    #[error("Module '{name}' not found from '{}' (searched node_modules up to the filesystem root)", .from.display())]
    ModuleNotFound { name: String, from: PathBuf },

    /// A manifest is missing, unreadable, or lacks `name`/`version`.
    #[error("Invalid manifest at '{}': {reason}", .path.display())]
    ManifestParse { path: PathBuf, reason: String },

    /// Two install locations claim the same module name.
    #[error(
        "Module '{name}' is installed more than once: {first_version} at '{}' and {second_version} at '{}'",
        .first_location.display(),
        .second_location.display()
    )]
    DuplicateModule {
        name: String,
        first_version: String,
        first_location: PathBuf,
        second_version: String,
        second_location: PathBuf,
    },

    /// Two modules declare the same namespace value in one category.
    #[error(
        "Namespace '{value}' in '{category}' is declared by both '{first_owner}' and '{second_owner}'"
    )]
    NamespaceConflict {
        category: String,
        value: String,
        first_owner: String,
        second_owner: String,
    },

    /// A namespace loader failed for a module.
    #[error("Namespace loader '{loader}' failed for module '{module}': {message}")]
    NamespaceLoader {
        loader: String,
        module: String,
        message: String,
    },

    /// The requested module is not part of the graph.
    #[error("Module '{0}' is not part of the module graph")]
    ModuleLookup(String),

    /// Dependency declarations form a cycle.
    #[error("Cyclic module dependency among: {}", .modules.join(", "))]
    CyclicDependency { modules: Vec<String> },

    /// Filesystem failure surfaced by the runtime.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ModuleError {
    /// Whether the error invalidates the whole build.
    ///
    /// Lookup failures only concern the caller that asked.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ModuleLookup(_))
    }
}

/// Result type alias for module graph operations.
pub type Result<T> = std::result::Result<T, ModuleError>;
