//! Package.json parsing.
//!
//! Reads the manifest fields the resolver cares about: identity, the
//! dependency lists, and whatever marker keys flag a package as a module or
//! plugin.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

use crate::error::{ModuleError, Result};
use crate::runtime::{Runtime, RuntimeError};

/// File name of an npm package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Parsed package.json structure.
///
/// Dependency maps keep declaration order so graph construction is
/// reproducible for a given tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    /// Package name
    pub name: Option<String>,
    /// Package version
    pub version: Option<String>,
    /// Production dependencies
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    /// Development dependencies
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: IndexMap<String, String>,
    /// Peer dependencies
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: IndexMap<String, String>,
    /// Optional dependencies
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: IndexMap<String, String>,
    /// Every other top-level key, used for marker detection
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// File path this was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackageJson {
    /// Load package.json from a specific path using the provided runtime.
    ///
    /// Rejects paths with `..` components, files larger than `max_size`
    /// bytes, invalid UTF-8, invalid JSON, and manifests without `name` or
    /// `version`.
    pub async fn from_path(runtime: &dyn Runtime, path: &Path, max_size: u64) -> Result<Self> {
        Self::validate_path(path)?;

        let metadata = runtime.metadata(path).await.map_err(|e| match e {
            RuntimeError::FileNotFound(_) => parse_error(path, "manifest not found"),
            other => parse_error(path, format!("cannot read metadata: {other}")),
        })?;

        if metadata.size > max_size {
            return Err(parse_error(
                path,
                format!("manifest exceeds maximum size of {max_size} bytes"),
            ));
        }

        let content_bytes = runtime
            .read_file(path)
            .await
            .map_err(|e| parse_error(path, format!("failed to read: {e}")))?;

        let content = String::from_utf8(content_bytes)
            .map_err(|e| parse_error(path, format!("invalid UTF-8: {e}")))?;

        let mut pkg = Self::from_json_str(&content).map_err(|reason| parse_error(path, reason))?;
        pkg.path = path.to_path_buf();
        Ok(pkg)
    }

    /// Parse manifest text, requiring `name` and `version`.
    pub fn from_json_str(content: &str) -> std::result::Result<Self, String> {
        let pkg: PackageJson =
            serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;

        if pkg.name.as_deref().is_none_or(str::is_empty) {
            return Err("missing required field 'name'".to_string());
        }
        if pkg.version.as_deref().is_none_or(str::is_empty) {
            return Err("missing required field 'version'".to_string());
        }

        Ok(pkg)
    }

    /// Package name; validated non-empty on load.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Package version; validated non-empty on load.
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or_default()
    }

    /// Whether the manifest carries a non-null top-level `key`.
    pub fn has_marker(&self, key: &str) -> bool {
        self.extra.get(key).is_some_and(|value| !value.is_null())
    }

    /// Dependency names to follow, in declaration order and deduplicated.
    ///
    /// `dependencies` always come first, then `devDependencies` and
    /// `peerDependencies` when requested. A name listed under
    /// `optionalDependencies` is never followed, even when another list
    /// repeats it: npm lets the optional entry win and may skip installing it.
    pub fn dependency_names(&self, include_dev: bool, include_peer: bool) -> Vec<String> {
        let mut names: IndexSet<&str> = self.dependencies.keys().map(String::as_str).collect();

        if include_dev {
            names.extend(self.dev_dependencies.keys().map(String::as_str));
        }

        if include_peer {
            names.extend(self.peer_dependencies.keys().map(String::as_str));
        }

        names
            .into_iter()
            .filter(|name| !self.optional_dependencies.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    /// Reject paths that try to climb out with `..`.
    fn validate_path(path: &Path) -> Result<()> {
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(parse_error(
                path,
                "path contains '..' (potential directory traversal)",
            ));
        }

        Ok(())
    }
}

fn parse_error(path: &Path, reason: impl Into<String>) -> ModuleError {
    ModuleError::ManifestParse {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_utils::TestRuntime;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_package_json_parse() {
        let json = r#"{
            "name": "test-package",
            "version": "1.0.0",
            "somod": "2.0.0",
            "dependencies": {
                "react": "^18.0.0",
                "lodash": "^4.17.21"
            },
            "devDependencies": {
                "@types/node": "^20.0.0"
            }
        }"#;

        let pkg = PackageJson::from_json_str(json).unwrap();

        assert_eq!(pkg.name(), "test-package");
        assert_eq!(pkg.version(), "1.0.0");
        assert!(pkg.has_marker("somod"));
        assert!(!pkg.has_marker("somod-plugin"));
        assert_eq!(pkg.dependencies.len(), 2);
        assert_eq!(pkg.dev_dependencies.len(), 1);
    }

    #[test]
    fn test_null_marker_is_ignored() {
        let pkg =
            PackageJson::from_json_str(r#"{"name": "a", "version": "1.0.0", "somod": null}"#)
                .unwrap();
        assert!(!pkg.has_marker("somod"));
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let err = PackageJson::from_json_str(r#"{"version": "1.0.0"}"#).unwrap_err();
        assert!(err.contains("'name'"));

        let err = PackageJson::from_json_str(r#"{"name": "a"}"#).unwrap_err();
        assert!(err.contains("'version'"));

        let err = PackageJson::from_json_str("not json").unwrap_err();
        assert!(err.starts_with("invalid JSON"));
    }

    #[test]
    fn test_dependency_names_keep_declaration_order() {
        let json = r#"{
            "name": "root",
            "version": "1.0.0",
            "dependencies": { "zeta": "1", "alpha": "1" },
            "devDependencies": { "beta": "1", "zeta": "1" },
            "peerDependencies": { "gamma": "1", "alpha": "1" },
            "optionalDependencies": { "never": "1" }
        }"#;

        let pkg = PackageJson::from_json_str(json).unwrap();

        assert_eq!(pkg.dependency_names(false, false), vec!["zeta", "alpha"]);
        assert_eq!(
            pkg.dependency_names(true, false),
            vec!["zeta", "alpha", "beta"]
        );
        assert_eq!(
            pkg.dependency_names(true, true),
            vec!["zeta", "alpha", "beta", "gamma"]
        );
    }

    #[test]
    fn test_optional_entry_overrides_other_lists() {
        let json = r#"{
            "name": "root",
            "version": "1.0.0",
            "dependencies": { "fsevents": "^2", "chokidar": "^3" },
            "devDependencies": { "fsevents": "^2" },
            "peerDependencies": { "fsevents": "^2" },
            "optionalDependencies": { "fsevents": "^2" }
        }"#;

        let pkg = PackageJson::from_json_str(json).unwrap();

        assert_eq!(pkg.dependency_names(false, false), vec!["chokidar"]);
        assert_eq!(pkg.dependency_names(true, true), vec!["chokidar"]);
    }

    #[test]
    fn test_validate_path_rejects_traversal() {
        assert!(PackageJson::validate_path(Path::new("../etc/passwd")).is_err());
        assert!(PackageJson::validate_path(Path::new("foo/../bar")).is_err());
        assert!(PackageJson::validate_path(Path::new("/abs/node_modules/a..b/package.json")).is_ok());
    }

    #[tokio::test]
    async fn test_from_path_reports_missing_and_oversized() {
        let temp = TempDir::new().unwrap();
        let runtime = TestRuntime::new(temp.path().to_path_buf());

        let missing = temp.path().join("package.json");
        let err = PackageJson::from_path(&runtime, &missing, 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::ManifestParse { ref reason, .. } if reason == "manifest not found"));

        fs::write(&missing, r#"{"name": "a", "version": "1.0.0"}"#).unwrap();
        let err = PackageJson::from_path(&runtime, &missing, 8)
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::ManifestParse { ref reason, .. } if reason.contains("maximum size")));

        let pkg = PackageJson::from_path(&runtime, &missing, 1024).await.unwrap();
        assert_eq!(pkg.name(), "a");
        assert_eq!(pkg.path, missing);
    }
}
