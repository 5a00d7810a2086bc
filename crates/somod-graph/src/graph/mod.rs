//! Arena-backed module graph.
//!
//! ```text
//!            ┌──────────────┐
//!            │  root (app)  │
//!            └──────┬───────┘
//!            ┌──────┴──────┐
//!            ▼             ▼
//!       ┌─────────┐   ┌─────────┐
//!       │    a    │   │    b    │
//!       └────┬────┘   └────┬────┘
//!            └──────┬──────┘
//!                   ▼
//!              ┌─────────┐
//!              │ shared  │   one node, two parents
//!              └─────────┘
//! ```
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]; the graph
//! owns every node and edges are plain indices in both directions. The
//! shape is fixed once [`GraphBuilder`] finishes.

mod builder;
mod chain;
mod sort;
mod statistics;

pub use builder::GraphBuilder;
pub use chain::DependencyChain;
pub use statistics::GraphStatistics;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexSet;
use rustc_hash::FxHashMap;

use crate::error::{ModuleError, Result};
use crate::module::Module;

/// Index of a node in its [`ModuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Graph vertex wrapping a [`Module`].
///
/// Parent and child sets keep first-link order.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    module: Arc<Module>,
    parents: IndexSet<NodeId>,
    children: IndexSet<NodeId>,
}

impl ModuleNode {
    fn new(module: Arc<Module>) -> Self {
        Self {
            module,
            parents: IndexSet::new(),
            children: IndexSet::new(),
        }
    }
}

/// The deduplicated module graph of one project root.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    nodes: Vec<ModuleNode>,
    by_location: FxHashMap<PathBuf, NodeId>,
    by_name: FxHashMap<String, NodeId>,
    /// Parents-before-children order, filled in by [`ModuleGraph::seal`].
    sorted: Vec<NodeId>,
}

impl ModuleGraph {
    /// Start a graph holding only the root module.
    pub(crate) fn with_root(root: Arc<Module>) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            by_location: FxHashMap::default(),
            by_name: FxHashMap::default(),
            sorted: Vec::new(),
        };
        graph.insert(root);
        graph
    }

    /// Node already created for `location`, if any.
    pub(crate) fn node_at(&self, location: &Path) -> Option<NodeId> {
        self.by_location.get(location).copied()
    }

    /// Add a node for a module not seen before.
    ///
    /// Fails with [`ModuleError::DuplicateModule`] when another location
    /// already provides a module of the same name.
    pub(crate) fn try_insert(&mut self, module: Arc<Module>) -> Result<NodeId> {
        if let Some(&existing) = self.by_name.get(&module.name) {
            let first = &self.nodes[existing.0].module;
            return Err(ModuleError::DuplicateModule {
                name: module.name.clone(),
                first_version: first.version.clone(),
                first_location: first.package_location.clone(),
                second_version: module.version.clone(),
                second_location: module.package_location.clone(),
            });
        }
        Ok(self.insert(module))
    }

    fn insert(&mut self, module: Arc<Module>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.by_location.insert(module.package_location.clone(), id);
        self.by_name.insert(module.name.clone(), id);
        self.nodes.push(ModuleNode::new(module));
        id
    }

    /// Record that `parent` depends on `child`. Repeated edges are ignored.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.insert(child);
        self.nodes[child.0].parents.insert(parent);
    }

    /// Compute the topological order; the graph is read-only afterwards.
    pub(crate) fn seal(mut self) -> Result<Self> {
        self.sorted = sort::topological_order(&self)?;
        Ok(self)
    }

    /// The root node.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId(0))
    }

    /// Look a node up by module name.
    pub fn get(&self, name: &str) -> Result<NodeRef<'_>> {
        self.by_name
            .get(name)
            .map(|&id| self.node(id))
            .ok_or_else(|| ModuleError::ModuleLookup(name.to_string()))
    }

    /// Look a node up by package location.
    pub fn get_by_location(&self, location: &Path) -> Option<NodeRef<'_>> {
        self.node_at(location).map(|id| self.node(id))
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { graph: self, id }
    }

    /// Nodes in parents-before-children order.
    pub fn sorted(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        self.sorted.iter().map(|&id| self.node(id))
    }

    /// Modules in parents-before-children order.
    pub fn modules(&self) -> impl ExactSizeIterator<Item = &Arc<Module>> + '_ {
        self.sorted.iter().map(|&id| &self.nodes[id.0].module)
    }

    /// Nodes in discovery order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        (0..self.nodes.len()).map(|i| self.node(NodeId(i)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a graph holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn children_of(&self, id: NodeId) -> &IndexSet<NodeId> {
        &self.nodes[id.0].children
    }

    pub(crate) fn parents_of(&self, id: NodeId) -> &IndexSet<NodeId> {
        &self.nodes[id.0].parents
    }
}

/// Borrowed view of one node with access to its neighbours.
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g ModuleGraph,
    id: NodeId,
}

impl<'g> NodeRef<'g> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn module(&self) -> &'g Arc<Module> {
        &self.graph.nodes[self.id.0].module
    }

    pub fn name(&self) -> &'g str {
        &self.module().name
    }

    /// Modules that depend on this one.
    pub fn parents(&self) -> impl ExactSizeIterator<Item = NodeRef<'g>> + 'g {
        let graph = self.graph;
        graph.parents_of(self.id).iter().map(move |&id| graph.node(id))
    }

    /// Modules this one depends on.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'g>> + 'g {
        let graph = self.graph;
        graph.children_of(self.id).iter().map(move |&id| graph.node(id))
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("module", &self.module().to_string())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::module::ModuleType;

    pub(crate) fn module(name: &str, module_type: ModuleType) -> Arc<Module> {
        Arc::new(Module {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            module_type,
            package_location: PathBuf::from(format!("/project/node_modules/{name}")),
            root: module_type == ModuleType::Root,
        })
    }

    #[test]
    fn links_are_bidirectional_and_deduplicated() {
        let mut graph = ModuleGraph::with_root(module("app", ModuleType::Root));
        let a = graph.try_insert(module("a", ModuleType::Module)).unwrap();
        let root = graph.root().id();

        graph.link(root, a);
        graph.link(root, a);

        let a_ref = graph.node(a);
        assert_eq!(a_ref.parents().map(|p| p.name()).collect::<Vec<_>>(), ["app"]);
        assert_eq!(graph.root().children().len(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut graph = ModuleGraph::with_root(module("app", ModuleType::Root));
        graph.try_insert(module("a", ModuleType::Module)).unwrap();

        let mut other = (*module("a", ModuleType::Module)).clone();
        other.version = "2.0.0".to_string();
        other.package_location = PathBuf::from("/project/node_modules/b/node_modules/a");

        let err = graph.try_insert(Arc::new(other)).unwrap_err();
        match err {
            ModuleError::DuplicateModule {
                first_version,
                second_version,
                ..
            } => {
                assert_eq!(first_version, "1.0.0");
                assert_eq!(second_version, "2.0.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lookup_of_unknown_name_fails_locally() {
        let graph = ModuleGraph::with_root(module("app", ModuleType::Root))
            .seal()
            .unwrap();

        assert!(matches!(graph.get("nope"), Err(ModuleError::ModuleLookup(name)) if name == "nope"));
        assert_eq!(graph.get("app").unwrap().id(), graph.root().id());
        assert!(
            graph
                .get_by_location(Path::new("/project/node_modules/app"))
                .is_some()
        );
    }
}
