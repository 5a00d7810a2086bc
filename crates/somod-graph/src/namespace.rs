//! Namespace aggregation across modules.
//!
//! Loaders are pure: each returns the namespaces one module declares,
//! keyed by category, and the resolver merges the answers. Loaders run
//! strictly in module order (parents before children) and, per module, in
//! the order they were supplied, so the first claimant of a value is
//! always the same module for a given graph.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, Result};
use crate::module::Module;

/// Namespaces declared by one module: category -> values.
pub type CategoryMap = IndexMap<String, Vec<String>>;

/// Error type loaders may return.
pub type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for namespace loaders.
pub type NamespaceResult<T> = std::result::Result<T, LoaderError>;

/// Produces the namespaces a module declares.
///
/// # Example
///
/// ```rust,ignore
/// struct RouteLoader;
///
/// #[async_trait]
/// impl NamespaceLoader for RouteLoader {
///     fn name(&self) -> &str {
///         "routes"
///     }
///
///     async fn load(&self, module: &Module) -> NamespaceResult<CategoryMap> {
///         let routes = read_routes(&module.package_location).await?;
///         Ok(CategoryMap::from([("API Gateway Route".to_string(), routes)]))
///     }
/// }
/// ```
#[async_trait]
pub trait NamespaceLoader: Send + Sync {
    /// Name used in error messages.
    fn name(&self) -> &str;

    async fn load(&self, module: &Module) -> NamespaceResult<CategoryMap>;
}

/// Adapts a synchronous closure into a [`NamespaceLoader`].
pub struct FnLoader<F> {
    name: String,
    f: F,
}

impl<F> FnLoader<F>
where
    F: Fn(&Module) -> NamespaceResult<CategoryMap> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLoader").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> NamespaceLoader for FnLoader<F>
where
    F: Fn(&Module) -> NamespaceResult<CategoryMap> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, module: &Module) -> NamespaceResult<CategoryMap> {
        (self.f)(module)
    }
}

/// Global registry: category -> namespace value -> owning module name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceMap {
    categories: IndexMap<String, IndexMap<String, String>>,
}

impl NamespaceMap {
    /// Module owning `value` in `category`.
    pub fn owner(&self, category: &str, value: &str) -> Option<&str> {
        self.categories
            .get(category)
            .and_then(|values| values.get(value))
            .map(String::as_str)
    }

    /// Every value of one category with its owner.
    pub fn category(&self, category: &str) -> Option<&IndexMap<String, String>> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, String>)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Claim `value` in `category` for `owner`.
    fn claim(&mut self, category: &str, value: &str, owner: &str) -> Result<()> {
        let values = self.categories.entry(category.to_string()).or_default();
        match values.entry(value.to_string()) {
            Entry::Occupied(existing) if existing.get() != owner => {
                Err(ModuleError::NamespaceConflict {
                    category: category.to_string(),
                    value: value.to_string(),
                    first_owner: existing.get().clone(),
                    second_owner: owner.to_string(),
                })
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner.to_string());
                Ok(())
            }
        }
    }
}

/// Outcome of namespace resolution for one graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedNamespaces {
    /// The conflict-checked global registry.
    pub map: NamespaceMap,
    /// What each module declared, in module order.
    pub by_module: IndexMap<String, CategoryMap>,
}

impl ResolvedNamespaces {
    pub fn module(&self, name: &str) -> Option<&CategoryMap> {
        self.by_module.get(name)
    }
}

/// Run every loader against every module and merge the results.
///
/// `modules` must already be in parents-before-children order.
///
/// # Errors
///
/// - [`ModuleError::NamespaceLoader`] when a loader fails
/// - [`ModuleError::NamespaceConflict`] when two modules claim the same
///   value in the same category
pub async fn resolve_namespaces<'a, I>(
    modules: I,
    loaders: &[Arc<dyn NamespaceLoader>],
) -> Result<ResolvedNamespaces>
where
    I: IntoIterator<Item = &'a Arc<Module>>,
{
    let started = Instant::now();
    let mut resolved = ResolvedNamespaces::default();

    for module in modules {
        let mut declared = CategoryMap::new();

        for loader in loaders {
            let loaded = loader
                .load(module)
                .await
                .map_err(|e| ModuleError::NamespaceLoader {
                    loader: loader.name().to_string(),
                    module: module.name.clone(),
                    message: e.to_string(),
                })?;

            for (category, values) in loaded {
                let entry = declared.entry(category).or_default();
                for value in values {
                    // the same module declaring a value twice is not a conflict
                    if !entry.contains(&value) {
                        entry.push(value);
                    }
                }
            }
        }

        for (category, values) in &declared {
            for value in values {
                resolved.map.claim(category, value, &module.name)?;
            }
        }

        tracing::debug!(
            module = %module,
            categories = declared.len(),
            "collected namespaces"
        );
        resolved.by_module.insert(module.name.clone(), declared);
    }

    tracing::info!(
        modules = resolved.by_module.len(),
        categories = resolved.map.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "namespaces resolved"
    );
    Ok(resolved)
}
