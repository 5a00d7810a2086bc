//! Per-root façade over the module graph.
//!
//! A handler does no I/O when created. The graph is built on the first
//! accessor call and namespaces on the first [`ModuleHandler::get_namespaces`]
//! call; both are cached for the handler's lifetime. Concurrent first calls
//! share one build, and a failed build is not cached.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use somod_config::ResolverConfig;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::graph::{GraphBuilder, ModuleGraph, NodeRef};
use crate::loader::ModuleLoader;
use crate::locator::PackageLocator;
use crate::namespace::{
    CategoryMap, NamespaceLoader, NamespaceMap, ResolvedNamespaces, resolve_namespaces,
};
use crate::runtime::Runtime;

/// Owns the module graph of one project root.
#[derive(Debug)]
pub struct ModuleHandler {
    root_dir: PathBuf,
    loader: Arc<ModuleLoader>,
    builder: GraphBuilder,
    graph: OnceCell<ModuleGraph>,
    namespaces: OnceCell<ResolvedNamespaces>,
    builds: AtomicUsize,
}

impl ModuleHandler {
    /// Create a handler for an absolute, normalized `root_dir`.
    ///
    /// Prefer [`ModuleRegistry::handler`](crate::ModuleRegistry::handler),
    /// which normalizes the path and shares handlers per root.
    pub fn new(root_dir: PathBuf, runtime: Arc<dyn Runtime>, config: Arc<ResolverConfig>) -> Self {
        let loader = Arc::new(ModuleLoader::new(
            Arc::clone(&runtime),
            Arc::clone(&config),
            root_dir.clone(),
        ));
        let builder = GraphBuilder::new(Arc::clone(&loader), PackageLocator::new(runtime), &config);

        Self {
            root_dir,
            loader,
            builder,
            graph: OnceCell::new(),
            namespaces: OnceCell::new(),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The fully built graph, building it on first use.
    pub async fn graph(&self) -> Result<&ModuleGraph> {
        self.graph
            .get_or_try_init(|| async {
                self.builds.fetch_add(1, Ordering::SeqCst);
                self.builder.build().await
            })
            .await
    }

    /// The node of the project itself.
    pub async fn root_module_node(&self) -> Result<NodeRef<'_>> {
        Ok(self.graph().await?.root())
    }

    /// The node for `name`.
    ///
    /// # Errors
    ///
    /// [`ModuleError::ModuleLookup`](crate::ModuleError::ModuleLookup) when
    /// the graph has no such module; the cached graph is unaffected.
    pub async fn get_module(&self, name: &str) -> Result<NodeRef<'_>> {
        self.graph().await?.get(name)
    }

    /// Every node, parents before children.
    pub async fn list_modules(&self) -> Result<Vec<NodeRef<'_>>> {
        Ok(self.graph().await?.sorted().collect())
    }

    /// Resolve namespaces with `loaders` on first call.
    ///
    /// Later calls return the cached map whatever loaders they pass.
    pub async fn get_namespaces(
        &self,
        loaders: &[Arc<dyn NamespaceLoader>],
    ) -> Result<&NamespaceMap> {
        if let Some(resolved) = self.namespaces.get() {
            tracing::debug!(
                root = %self.root_dir.display(),
                ignored_loaders = loaders.len(),
                "namespaces already resolved, returning cached map"
            );
            return Ok(&resolved.map);
        }

        let resolved = self
            .namespaces
            .get_or_try_init(|| async {
                let graph = self.graph().await?;
                resolve_namespaces(graph.modules(), loaders).await
            })
            .await?;
        Ok(&resolved.map)
    }

    /// What `name` declared, once namespaces have been resolved.
    pub fn module_namespaces(&self, name: &str) -> Option<&CategoryMap> {
        self.namespaces.get().and_then(|resolved| resolved.module(name))
    }

    /// How many times graph construction has started.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Manifests read from disk by this handler.
    pub fn manifest_reads(&self) -> usize {
        self.loader.load_count()
    }
}
