use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::package_json::PackageJson;

/// Descriptor for one discovered package.
///
/// Constructed at most once per `package_location` by the
/// [`ModuleLoader`](crate::ModuleLoader) and shared as `Arc<Module>` from then
/// on. Namespaces are not part of the descriptor: they are produced by the
/// namespace resolver and looked up through the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub version: String,
    pub module_type: ModuleType,
    /// Directory containing the package's `package.json`.
    pub package_location: PathBuf,
    /// True only for the project being built.
    pub root: bool,
}

impl Module {
    /// Build a descriptor from a parsed manifest.
    pub fn from_manifest(manifest: &PackageJson, location: &Path, module_type: ModuleType) -> Self {
        Self {
            name: manifest.name().to_string(),
            version: manifest.version().to_string(),
            module_type,
            package_location: location.to_path_buf(),
            root: module_type == ModuleType::Root,
        }
    }

    pub fn is_plugin(&self) -> bool {
        self.module_type == ModuleType::Plugin
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Category tag of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// The project being built.
    Root,
    /// A dependency carrying the module marker.
    Module,
    /// A dependency carrying the plugin marker.
    Plugin,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Module => "module",
            Self::Plugin => "plugin",
        }
    }
}
