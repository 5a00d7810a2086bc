//! Registry of module handlers keyed by project root.
//!
//! Owned by the application context and passed to whoever needs graph
//! access; tests construct a fresh one each.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use somod_config::ResolverConfig;

use crate::handler::ModuleHandler;
use crate::runtime::native::NativeRuntime;
use crate::runtime::{Runtime, RuntimeResult};

/// One [`ModuleHandler`] per normalized root directory.
#[derive(Debug)]
pub struct ModuleRegistry {
    runtime: Arc<dyn Runtime>,
    config: Arc<ResolverConfig>,
    handlers: Mutex<FxHashMap<PathBuf, Arc<ModuleHandler>>>,
}

impl ModuleRegistry {
    pub fn new(runtime: Arc<dyn Runtime>, config: ResolverConfig) -> Self {
        Self {
            runtime,
            config: Arc::new(config),
            handlers: Mutex::new(FxHashMap::default()),
        }
    }

    /// Registry backed by the real filesystem.
    pub fn native(config: ResolverConfig) -> Self {
        Self::new(Arc::new(NativeRuntime::new()), config)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The handler for `root_dir`, created on first request.
    ///
    /// Relative paths are resolved against the runtime's working directory
    /// and `.`/`..` segments are removed, so `./app` and `app/` share a
    /// handler. Creating a handler does no I/O.
    pub fn handler(&self, root_dir: impl AsRef<Path>) -> RuntimeResult<Arc<ModuleHandler>> {
        let key = self.normalize(root_dir.as_ref())?;

        let mut handlers = self.handlers.lock();
        let handler = handlers.entry(key).or_insert_with_key(|key| {
            tracing::debug!(root = %key.display(), "creating module handler");
            Arc::new(ModuleHandler::new(
                key.clone(),
                Arc::clone(&self.runtime),
                Arc::clone(&self.config),
            ))
        });
        Ok(Arc::clone(handler))
    }

    /// Number of distinct roots seen so far.
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    fn normalize(&self, root_dir: &Path) -> RuntimeResult<PathBuf> {
        let absolute = if root_dir.is_absolute() {
            root_dir.to_path_buf()
        } else {
            self.runtime.get_cwd()?.join(root_dir)
        };
        Ok(path_clean::clean(absolute))
    }
}
