//! Breadth-first graph construction.
//!
//! Each BFS level is expanded concurrently: locating and loading every
//! declared dependency of every node in the level runs on a `JoinSet`,
//! bounded by a semaphore. Results are put back into (parent, declaration)
//! order before any node is linked, so the graph comes out the same as a
//! sequential walk would produce.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use somod_config::ResolverConfig;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{ModuleGraph, NodeId};
use crate::error::{ModuleError, Result};
use crate::loader::{LoadedPackage, ModuleLoader};
use crate::locator::PackageLocator;
use crate::runtime::RuntimeError;

/// Builds the [`ModuleGraph`] for one project root.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    loader: Arc<ModuleLoader>,
    locator: PackageLocator,
    max_concurrent_loads: usize,
}

/// One dependency edge waiting to be resolved.
struct Pending {
    parent_pos: usize,
    dep_pos: usize,
    from: PathBuf,
    name: String,
}

/// Outcome of resolving one [`Pending`] edge.
struct Resolved {
    parent_pos: usize,
    dep_pos: usize,
    result: Result<Arc<LoadedPackage>>,
}

impl GraphBuilder {
    pub fn new(loader: Arc<ModuleLoader>, locator: PackageLocator, config: &ResolverConfig) -> Self {
        Self {
            loader,
            locator,
            max_concurrent_loads: config.max_concurrent_loads.max(1),
        }
    }

    /// Load the root and everything reachable from it.
    ///
    /// # Errors
    ///
    /// Fails on the first (in declaration order) missing dependency,
    /// unreadable manifest, duplicate module name or dependency cycle.
    pub async fn build(&self) -> Result<ModuleGraph> {
        let started = Instant::now();
        let root_location = self.loader.root_location().to_path_buf();

        let root_pkg = self.loader.load(&root_location).await?;
        let root_module = root_pkg.module.clone().ok_or_else(|| ModuleError::ManifestParse {
            path: root_location.clone(),
            reason: "root package could not be loaded as a module".to_string(),
        })?;

        let mut graph = ModuleGraph::with_root(root_module);
        let mut level: Vec<(NodeId, Arc<LoadedPackage>)> = vec![(graph.root().id(), root_pkg)];
        let mut depth = 0usize;

        while !level.is_empty() {
            let resolved = self.expand_level(&level).await?;

            let mut next_level = Vec::new();
            for edge in resolved {
                let (parent, _) = &level[edge.parent_pos];
                let pkg = edge.result?;

                let Some(module) = pkg.module.clone() else {
                    tracing::trace!(
                        package = pkg.manifest.name(),
                        "skipping dependency without module marker"
                    );
                    continue;
                };

                let child = match graph.node_at(&module.package_location) {
                    Some(existing) => existing,
                    None => {
                        let id = graph.try_insert(Arc::clone(&module))?;
                        next_level.push((id, pkg));
                        id
                    }
                };

                tracing::debug!(
                    parent = graph.node(*parent).name(),
                    child = %module,
                    depth = depth + 1,
                    "linked module"
                );
                graph.link(*parent, child);
            }

            level = next_level;
            depth += 1;
        }

        let graph = graph.seal()?;
        tracing::info!(
            root = %root_location.display(),
            modules = graph.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "module graph built"
        );
        Ok(graph)
    }

    /// Locate and load every dependency declared by the nodes of `level`.
    ///
    /// The returned edges are sorted by (parent position, declaration
    /// position).
    async fn expand_level(&self, level: &[(NodeId, Arc<LoadedPackage>)]) -> Result<Vec<Resolved>> {
        let pending = level.iter().enumerate().flat_map(|(parent_pos, (_, pkg))| {
            let from = pkg.manifest.path.parent().map(PathBuf::from).unwrap_or_default();
            pkg.dependencies
                .iter()
                .enumerate()
                .map(move |(dep_pos, name)| Pending {
                    parent_pos,
                    dep_pos,
                    from: from.clone(),
                    name: name.clone(),
                })
        });

        let permits = Arc::new(Semaphore::new(self.max_concurrent_loads));
        let mut tasks = JoinSet::new();

        for edge in pending {
            let loader = Arc::clone(&self.loader);
            let locator = self.locator.clone();
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let result: Result<Arc<LoadedPackage>> = async {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| RuntimeError::Other(format!("load limiter closed: {e}")))?;
                    let location = locator.locate(&edge.from, &edge.name)?;
                    loader.load(&location).await
                }
                .await;

                Resolved {
                    parent_pos: edge.parent_pos,
                    dep_pos: edge.dep_pos,
                    result,
                }
            });
        }

        let mut resolved = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let edge = joined.map_err(|e| RuntimeError::Other(format!("Task join error: {e}")))?;
            resolved.push(edge);
        }

        resolved.sort_by_key(|edge| (edge.parent_pos, edge.dep_pos));
        Ok(resolved)
    }
}
