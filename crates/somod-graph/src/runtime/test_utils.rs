//! Test utilities for somod-graph.
//!
//! - `TestRuntime`: a filesystem runtime rooted at a temp directory that
//!   counts manifest reads
//! - `PackageFixture`: writes `node_modules` trees for graph tests

// Test utilities are allowed to use std::fs since they only run on native platforms
#![allow(clippy::disallowed_methods)]

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Simple test runtime that wraps std::fs for native tests.
///
/// Rather than mocking the filesystem, tests build real package trees in a
/// `tempfile::TempDir` and point the runtime at it. Every `read_file` call
/// is counted so loader memoization can be asserted.
#[derive(Debug)]
pub struct TestRuntime {
    cwd: PathBuf,
    reads: AtomicUsize,
}

impl TestRuntime {
    /// Create a new test runtime with the specified working directory.
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of `read_file` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(path.to_path_buf())
            } else {
                RuntimeError::Io(e.to_string())
            }
        })
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(path.to_path_buf())
            } else {
                RuntimeError::Io(e.to_string())
            }
        })?;
        Ok(FileMetadata {
            size: metadata.len(),
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            modified: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}

/// Builder for a `package.json` written into a fixture tree.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    name: String,
    version: String,
    marker: Option<&'static str>,
    dependencies: Vec<String>,
    dev_dependencies: Vec<String>,
    peer_dependencies: Vec<String>,
    optional_dependencies: Vec<String>,
}

impl PackageFixture {
    /// A plain npm package (no SOMOD marker).
    pub fn package(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            marker: None,
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
            peer_dependencies: Vec::new(),
            optional_dependencies: Vec::new(),
        }
    }

    /// A package carrying the default module marker.
    pub fn module(name: &str, version: &str) -> Self {
        Self {
            marker: Some(somod_config::DEFAULT_MODULE_MARKER),
            ..Self::package(name, version)
        }
    }

    /// A package carrying the default plugin marker.
    pub fn plugin(name: &str, version: &str) -> Self {
        Self {
            marker: Some(somod_config::DEFAULT_PLUGIN_MARKER),
            ..Self::package(name, version)
        }
    }

    pub fn dep(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }

    pub fn dev_dep(mut self, name: &str) -> Self {
        self.dev_dependencies.push(name.to_string());
        self
    }

    pub fn peer_dep(mut self, name: &str) -> Self {
        self.peer_dependencies.push(name.to_string());
        self
    }

    pub fn optional_dep(mut self, name: &str) -> Self {
        self.optional_dependencies.push(name.to_string());
        self
    }

    /// Render the manifest as JSON.
    pub fn to_json(&self) -> Value {
        fn deps(names: &[String]) -> Value {
            Value::Object(
                names
                    .iter()
                    .map(|n| (n.clone(), json!("^1.0.0")))
                    .collect::<Map<_, _>>(),
            )
        }

        let mut manifest = Map::new();
        manifest.insert("name".into(), json!(self.name));
        manifest.insert("version".into(), json!(self.version));
        if let Some(marker) = self.marker {
            manifest.insert(marker.into(), json!("1.0.0"));
        }
        manifest.insert("dependencies".into(), deps(&self.dependencies));
        manifest.insert("devDependencies".into(), deps(&self.dev_dependencies));
        manifest.insert("peerDependencies".into(), deps(&self.peer_dependencies));
        manifest.insert(
            "optionalDependencies".into(),
            deps(&self.optional_dependencies),
        );
        Value::Object(manifest)
    }

    /// Write `package.json` into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir).expect("create package dir");
        let body = serde_json::to_vec_pretty(&self.to_json()).expect("serialize manifest");
        std::fs::write(dir.join("package.json"), body).expect("write package.json");
        dir.to_path_buf()
    }

    /// Write the package as `<base>/node_modules/<name>`.
    pub fn install_into(&self, base: &Path) -> PathBuf {
        self.write_to(&base.join("node_modules").join(&self.name))
    }
}
