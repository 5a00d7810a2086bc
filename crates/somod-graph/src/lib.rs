//! # somod-graph
//!
//! Module dependency resolution and namespace aggregation for SOMOD
//! projects.
//!
//! ## Overview
//!
//! Given a project root and its installed `node_modules` tree, this crate:
//!
//! - **Discovers modules**: installed packages whose `package.json` carries
//!   the module (or plugin) marker
//! - **Builds a deduplicated graph**: one node per install location, with
//!   parent and child edges, despite npm's hoisted layout
//! - **Rejects conflicts**: two locations providing one module name, or
//!   dependency cycles
//! - **Orders modules**: parents always before children
//! - **Aggregates namespaces**: merges what pluggable loaders report per
//!   module into one conflict-checked registry per category
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ModuleRegistry   (root dir -> ModuleHandler) │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │ ModuleHandler    (lazy, cached per root)     │
//! └──────┬───────────────────────────────┬───────┘
//!        ▼                               ▼
//! ┌──────────────┐               ┌───────────────────┐
//! │ GraphBuilder │               │ resolve_namespaces│
//! └──┬────────┬──┘               └───────────────────┘
//!    ▼        ▼
//! ┌────────┐ ┌──────────────┐
//! │Locator │ │ ModuleLoader │──▶ Runtime (read-only fs)
//! └────────┘ └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use somod_config::ResolverConfig;
//! use somod_graph::ModuleRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ModuleRegistry::native(ResolverConfig::load(".")?);
//! let handler = registry.handler(".")?;
//!
//! for node in handler.list_modules().await? {
//!     println!("{} ({} parents)", node.module(), node.parents().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod graph;
pub mod handler;
pub mod loader;
pub mod locator;
pub mod module;
pub mod namespace;
pub mod package_json;
pub mod registry;
pub mod runtime;

pub use error::{ModuleError, Result};
pub use graph::{
    DependencyChain, GraphBuilder, GraphStatistics, ModuleGraph, ModuleNode, NodeId, NodeRef,
};
pub use handler::ModuleHandler;
pub use loader::{LoadedPackage, ModuleLoader};
pub use locator::PackageLocator;
pub use module::{Module, ModuleType};
pub use namespace::{
    CategoryMap, FnLoader, LoaderError, NamespaceLoader, NamespaceMap, NamespaceResult,
    ResolvedNamespaces, resolve_namespaces,
};
pub use package_json::PackageJson;
pub use registry::ModuleRegistry;

// Re-export runtime types
pub use runtime::native::NativeRuntime;
pub use runtime::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::test_utils::{PackageFixture, TestRuntime};

#[cfg(test)]
mod tests;
