//! Tests for config file discovery and layered loading
//!
//! Every test runs inside a figment `Jail` so environment overrides set by
//! one test never leak into another.

use figment::Jail;
use somod_config::{ConfigDiscovery, ConfigError, ResolverConfig};

#[test]
fn missing_file_yields_defaults() {
    Jail::expect_with(|jail| {
        let discovery = ConfigDiscovery::new(jail.directory());
        assert!(discovery.find().is_none());

        let config = discovery.load().unwrap();
        assert_eq!(config, ResolverConfig::default());
        Ok(())
    });
}

#[test]
fn load_required_fails_without_file() {
    Jail::expect_with(|jail| {
        let err = ConfigDiscovery::new(jail.directory())
            .load_required()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(path) if path == jail.directory()));
        Ok(())
    });
}

#[test]
fn discovers_somod_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "somod.toml",
            r#"
module_marker = "my-marker"
include_peer_dependencies = false
max_concurrent_loads = 4
"#,
        )?;

        let discovery = ConfigDiscovery::new(jail.directory());
        let found = discovery.find().unwrap();
        assert_eq!(found.file_name().unwrap(), "somod.toml");

        let config = discovery.load().unwrap();
        assert_eq!(config.module_marker, "my-marker");
        assert!(!config.include_peer_dependencies);
        assert_eq!(config.max_concurrent_loads, 4);
        // untouched fields keep their defaults
        assert_eq!(config.plugin_marker, "somod-plugin");
        assert!(config.include_root_dev_dependencies);
        Ok(())
    });
}

#[test]
fn invalid_toml_is_reported() {
    Jail::expect_with(|jail| {
        jail.create_file("somod.toml", "max_concurrent_loads = \"many\"")?;

        let err = ConfigDiscovery::new(jail.directory()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        Ok(())
    });
}

#[test]
fn invalid_values_fail_validation() {
    Jail::expect_with(|jail| {
        jail.create_file("somod.toml", "max_concurrent_loads = 0")?;

        let err = ResolverConfig::load(jail.directory()).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { field, .. } if field == "max_concurrent_loads")
        );
        Ok(())
    });
}

#[test]
fn environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "somod.toml",
            r#"
max_concurrent_loads = 4
include_root_dev_dependencies = true
"#,
        )?;
        jail.set_env("SOMOD_MAX_CONCURRENT_LOADS", "2");
        jail.set_env("SOMOD_INCLUDE_ROOT_DEV_DEPENDENCIES", "false");

        let config = ResolverConfig::load(jail.directory()).unwrap();
        assert_eq!(config.max_concurrent_loads, 2);
        assert!(!config.include_root_dev_dependencies);
        Ok(())
    });
}
