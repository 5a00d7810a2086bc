//! Resolver configuration for the SOMOD module graph.
//!
//! For file discovery and layered loading, see the `discovery` module.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::discovery::ConfigDiscovery;
use crate::error::{ConfigError, Result};

/// Default manifest key that marks a package as a SOMOD module.
pub const DEFAULT_MODULE_MARKER: &str = "somod";

/// Default manifest key that marks a package as a SOMOD plugin.
pub const DEFAULT_PLUGIN_MARKER: &str = "somod-plugin";

/// Default bound on manifest loads in flight within one BFS level.
pub const DEFAULT_MAX_CONCURRENT_LOADS: usize = 16;

/// Maximum allowed size for package.json files (10MB)
pub const DEFAULT_MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024;

/// Settings that shape how the module graph is discovered.
///
/// Every field has a default, so an empty `somod.toml` (or none at all)
/// yields [`ResolverConfig::default`].
///
/// # Example
///
/// ```
/// use somod_config::ResolverConfig;
///
/// let config = ResolverConfig::default();
/// assert_eq!(config.module_marker, "somod");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Manifest key whose presence marks a package as a module.
    pub module_marker: String,

    /// Manifest key whose presence marks a package as a plugin.
    pub plugin_marker: String,

    /// Follow `peerDependencies` in addition to `dependencies`.
    pub include_peer_dependencies: bool,

    /// Follow the root project's `devDependencies`.
    pub include_root_dev_dependencies: bool,

    /// Upper bound on manifests located and loaded at once within one BFS
    /// level.
    pub max_concurrent_loads: usize,

    /// Manifests larger than this many bytes are rejected.
    pub max_manifest_size: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            module_marker: DEFAULT_MODULE_MARKER.to_string(),
            plugin_marker: DEFAULT_PLUGIN_MARKER.to_string(),
            include_peer_dependencies: true,
            include_root_dev_dependencies: true,
            max_concurrent_loads: DEFAULT_MAX_CONCURRENT_LOADS,
            max_manifest_size: DEFAULT_MAX_MANIFEST_SIZE,
        }
    }
}

impl ResolverConfig {
    /// Discover and load the configuration for a project root.
    ///
    /// Priority: environment variables > `somod.toml` > defaults.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        ConfigDiscovery::new(root).load()
    }

    /// Reject settings the graph builder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.module_marker.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "module_marker".to_string(),
                hint: Some("marker key cannot be empty".to_string()),
            });
        }

        if self.plugin_marker.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "plugin_marker".to_string(),
                hint: Some("marker key cannot be empty".to_string()),
            });
        }

        if self.module_marker == self.plugin_marker {
            return Err(ConfigError::InvalidValue {
                field: "plugin_marker".to_string(),
                hint: Some(format!(
                    "must differ from module_marker ('{}')",
                    self.module_marker
                )),
            });
        }

        if self.max_concurrent_loads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_loads".to_string(),
                hint: Some("use at least 1".to_string()),
            });
        }

        if self.max_manifest_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_manifest_size".to_string(),
                hint: Some("size limit must be positive".to_string()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ResolverConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_marker() {
        let config = ResolverConfig {
            module_marker: "  ".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("module_marker"));
    }

    #[test]
    fn rejects_equal_markers() {
        let config = ResolverConfig {
            plugin_marker: DEFAULT_MODULE_MARKER.to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "plugin_marker"
        ));
    }

    #[test]
    fn rejects_zero_limits() {
        let config = ResolverConfig {
            max_concurrent_loads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ResolverConfig {
            max_manifest_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
