//! Memoized manifest loading.
//!
//! One disk read per unique package location. The memo table hands out a
//! shared `OnceCell` per location, so concurrent loads of the same location
//! converge on a single read and a single [`Module`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use somod_config::ResolverConfig;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::module::{Module, ModuleType};
use crate::package_json::{MANIFEST_FILE, PackageJson};
use crate::runtime::Runtime;

/// A package read from disk.
#[derive(Debug)]
pub struct LoadedPackage {
    pub manifest: PackageJson,
    /// `None` for packages that are neither the root nor marked as a
    /// module or plugin.
    pub module: Option<Arc<Module>>,
    /// Dependency names the graph builder should follow from here.
    pub dependencies: Vec<String>,
}

type Slot = Arc<OnceCell<Arc<LoadedPackage>>>;

/// Location-keyed loader for package manifests.
#[derive(Debug)]
pub struct ModuleLoader {
    runtime: Arc<dyn Runtime>,
    config: Arc<ResolverConfig>,
    root_location: PathBuf,
    cache: DashMap<PathBuf, Slot>,
    loads: AtomicUsize,
}

impl ModuleLoader {
    /// Create a loader for the project rooted at `root_location`.
    ///
    /// The package at `root_location` is always typed
    /// [`ModuleType::Root`], whatever markers it carries.
    pub fn new(
        runtime: Arc<dyn Runtime>,
        config: Arc<ResolverConfig>,
        root_location: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            config,
            root_location: root_location.into(),
            cache: DashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn root_location(&self) -> &Path {
        &self.root_location
    }

    /// Load the package at `location`, reading disk only the first time.
    pub async fn load(&self, location: &Path) -> Result<Arc<LoadedPackage>> {
        // Clone the slot out so no map guard is held across the await
        let slot: Slot = self.cache.entry(location.to_path_buf()).or_default().clone();

        let loaded = slot.get_or_try_init(|| self.read(location)).await?;
        Ok(Arc::clone(loaded))
    }

    /// Number of manifests actually read from disk.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of locations with a memoized result.
    pub fn cached_locations(&self) -> usize {
        self.cache.iter().filter(|slot| slot.initialized()).count()
    }

    async fn read(&self, location: &Path) -> Result<Arc<LoadedPackage>> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        let manifest_path = location.join(MANIFEST_FILE);
        let manifest = PackageJson::from_path(
            self.runtime.as_ref(),
            &manifest_path,
            self.config.max_manifest_size,
        )
        .await?;

        let is_root = location == self.root_location;
        let module_type = if is_root {
            Some(ModuleType::Root)
        } else if manifest.has_marker(&self.config.plugin_marker) {
            Some(ModuleType::Plugin)
        } else if manifest.has_marker(&self.config.module_marker) {
            Some(ModuleType::Module)
        } else {
            None
        };

        let module = module_type.map(|ty| Arc::new(Module::from_manifest(&manifest, location, ty)));

        let dependencies = match module {
            Some(_) => manifest.dependency_names(
                is_root && self.config.include_root_dev_dependencies,
                self.config.include_peer_dependencies,
            ),
            None => Vec::new(),
        };

        tracing::debug!(
            package = manifest.name(),
            version = manifest.version(),
            location = %location.display(),
            module_type = module_type.map(|t| t.as_str()).unwrap_or("none"),
            "loaded manifest"
        );

        Ok(Arc::new(LoadedPackage {
            manifest,
            module,
            dependencies,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleError;
    use crate::runtime::test_utils::{PackageFixture, TestRuntime};
    use tempfile::TempDir;

    fn loader(temp: &TempDir, runtime: Arc<TestRuntime>) -> ModuleLoader {
        ModuleLoader::new(
            runtime,
            Arc::new(ResolverConfig::default()),
            temp.path().to_path_buf(),
        )
    }

    #[tokio::test]
    async fn second_load_reuses_the_first() {
        let temp = TempDir::new().unwrap();
        let location = PackageFixture::module("a", "1.0.0").install_into(temp.path());
        let runtime = Arc::new(TestRuntime::new(temp.path().to_path_buf()));
        let loader = loader(&temp, runtime.clone());

        let first = loader.load(&location).await.unwrap();
        let reads_after_first = runtime.read_count();
        let second = loader.load(&location).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(
            first.module.as_ref().unwrap(),
            second.module.as_ref().unwrap()
        ));
        assert_eq!(runtime.read_count(), reads_after_first);
        assert_eq!(loader.load_count(), 1);
        assert_eq!(loader.cached_locations(), 1);
    }

    #[tokio::test]
    async fn concurrent_loads_converge() {
        let temp = TempDir::new().unwrap();
        let location = PackageFixture::module("a", "1.0.0").install_into(temp.path());
        let runtime = Arc::new(TestRuntime::new(temp.path().to_path_buf()));
        let loader = Arc::new(loader(&temp, runtime.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = Arc::clone(&loader);
                let location = location.clone();
                tokio::spawn(async move { loader.load(&location).await.unwrap() })
            })
            .collect();

        let mut loaded = Vec::new();
        for handle in handles {
            loaded.push(handle.await.unwrap());
        }

        assert!(loaded.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(loader.load_count(), 1);
        assert_eq!(runtime.read_count(), 1);
    }

    #[tokio::test]
    async fn classifies_packages_by_marker() {
        let temp = TempDir::new().unwrap();
        let root = PackageFixture::package("app", "1.0.0")
            .dev_dep("m")
            .peer_dep("p")
            .write_to(temp.path());
        let module = PackageFixture::module("m", "1.0.0").dev_dep("x").install_into(&root);
        let plugin = PackageFixture::plugin("p", "1.0.0").install_into(&root);
        let plain = PackageFixture::package("lodash", "4.0.0").dep("y").install_into(&root);

        let loader = loader(&temp, Arc::new(TestRuntime::new(root.clone())));

        let root_pkg = loader.load(&root).await.unwrap();
        let root_module = root_pkg.module.as_ref().unwrap();
        assert_eq!(root_module.module_type, ModuleType::Root);
        assert!(root_module.root);
        assert_eq!(root_pkg.dependencies, vec!["m", "p"]);

        let module_pkg = loader.load(&module).await.unwrap();
        assert_eq!(module_pkg.module.as_ref().unwrap().module_type, ModuleType::Module);
        // devDependencies are only followed for the root
        assert!(module_pkg.dependencies.is_empty());

        let plugin_pkg = loader.load(&plugin).await.unwrap();
        assert_eq!(plugin_pkg.module.as_ref().unwrap().module_type, ModuleType::Plugin);

        let plain_pkg = loader.load(&plain).await.unwrap();
        assert!(plain_pkg.module.is_none());
        assert!(plain_pkg.dependencies.is_empty());
    }

    #[tokio::test]
    async fn invalid_manifest_is_reported_and_not_cached() {
        let temp = TempDir::new().unwrap();
        let location = temp.path().join("node_modules/broken");
        std::fs::create_dir_all(&location).unwrap();
        std::fs::write(location.join("package.json"), r#"{"name": "broken"}"#).unwrap();

        let loader = loader(&temp, Arc::new(TestRuntime::new(temp.path().to_path_buf())));

        let err = loader.load(&location).await.unwrap_err();
        assert!(matches!(err, ModuleError::ManifestParse { .. }));
        assert_eq!(loader.cached_locations(), 0);
    }
}
