//! End-to-end tests over real `node_modules` trees.
//!
//! - `handler_tests`: graph construction through `ModuleHandler`
//! - `namespace_tests`: namespace aggregation through `ModuleHandler`
//! - `property_tests`: ordering and exactly-once invariants on generated trees


use std::path::{Path, PathBuf};
use std::sync::Arc;

use somod_config::ResolverConfig;
use tempfile::TempDir;

use crate::runtime::test_utils::TestRuntime;
use crate::{ModuleHandler, ModuleRegistry, NodeRef};

/// A temp project plus a counting runtime rooted at it.
pub(crate) struct Project {
    pub temp: TempDir,
    pub runtime: Arc<TestRuntime>,
}

impl Project {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let runtime = Arc::new(TestRuntime::new(temp.path().to_path_buf()));
        Self { temp, runtime }
    }

    /// Directory of the project being built.
    pub fn root(&self) -> PathBuf {
        self.temp.path().join("app")
    }

    pub fn registry(&self) -> ModuleRegistry {
        self.registry_with(ResolverConfig::default())
    }

    pub fn registry_with(&self, config: ResolverConfig) -> ModuleRegistry {
        ModuleRegistry::new(self.runtime.clone(), config)
    }

    pub fn handler(&self) -> Arc<ModuleHandler> {
        self.registry()
            .handler(self.root())
            .expect("create handler")
    }
}

pub(crate) fn names<'g>(nodes: impl IntoIterator<Item = NodeRef<'g>>) -> Vec<&'g str> {
    nodes.into_iter().map(|node| node.name()).collect()
}

pub(crate) fn nm(base: &Path, name: &str) -> PathBuf {
    base.join("node_modules").join(name)
}
