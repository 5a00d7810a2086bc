//! File-based config discovery
//!
//! Handles finding `somod.toml` and layering it with defaults and the
//! environment.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};

use crate::config::ResolverConfig;
use crate::error::{ConfigError, Result};

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "somod.toml";

/// Prefix for environment overrides (`SOMOD_MAX_CONCURRENT_LOADS=4`).
pub const ENV_PREFIX: &str = "SOMOD_";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use somod_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Create a new config discovery with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE_NAME);
        toml_path.is_file().then_some(toml_path)
    }

    /// Load config from the discovered file, falling back to defaults when
    /// there is none.
    pub fn load(&self) -> Result<ResolverConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(ResolverConfig::default()));

        match self.find() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading resolver config");
                figment = figment.merge(Toml::file(path));
            }
            None => {
                tracing::trace!(root = %self.root.display(), "no {CONFIG_FILE_NAME}, using defaults");
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: ResolverConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config strictly from the discovered file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if there is no `somod.toml`.
    pub fn load_required(&self) -> Result<ResolverConfig> {
        if self.find().is_none() {
            return Err(ConfigError::NotFound(self.root.clone()));
        }
        self.load()
    }
}
