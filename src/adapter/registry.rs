//! Registry mapping configuration keys to adapter constructors.

use super::{BoonAdapter, JsonschemaAdapter, ValidatorAdapter};
use crate::config::{AdapterOptions, HarnessConfig};
use crate::error::ConfigError;
use log::info;
use std::collections::BTreeMap;

/// Builds a fresh adapter instance.
pub type AdapterConstructor = fn(&AdapterOptions) -> Box<dyn ValidatorAdapter>;

/// Maps a validator key (as given in `VALIDATOR`) to its constructor.
///
/// Unknown or missing keys are configuration errors; there is no default
/// adapter.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    constructors: BTreeMap<String, AdapterConstructor>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every adapter shipped in this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("jsonschema", |options| {
            Box::new(JsonschemaAdapter::new(options))
        });
        registry.register("boon", |options| Box::new(BoonAdapter::new(options)));
        registry
    }

    /// Register a constructor, replacing any previous one for `key`.
    pub fn register(&mut self, key: impl Into<String>, constructor: AdapterConstructor) {
        self.constructors.insert(key.into(), constructor);
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Construct the adapter registered under `key`.
    pub fn create(
        &self,
        key: &str,
        options: &AdapterOptions,
    ) -> Result<Box<dyn ValidatorAdapter>, ConfigError> {
        let constructor =
            self.constructors
                .get(key)
                .ok_or_else(|| ConfigError::UnknownValidator {
                    key: key.to_string(),
                    known: self.keys(),
                })?;

        info!("Using validator '{}'", key);
        Ok(constructor(options))
    }

    /// Construct the adapter selected by `config.validator`.
    pub fn from_config(
        &self,
        config: &HarnessConfig,
    ) -> Result<Box<dyn ValidatorAdapter>, ConfigError> {
        match config.validator.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                self.create(key.trim(), &config.adapter_options())
            }
            _ => Err(ConfigError::MissingValidator { known: self.keys() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(registry.keys(), vec!["boon", "jsonschema"]);
    }

    #[test]
    fn test_create_known_adapter() {
        let registry = AdapterRegistry::with_defaults();
        let adapter = registry
            .create("jsonschema", &AdapterOptions::default())
            .unwrap();
        assert_eq!(adapter.name(), "jsonschema");
    }

    #[test]
    fn test_unknown_key_is_fatal() {
        let registry = AdapterRegistry::with_defaults();
        match registry.create("xeipuuv", &AdapterOptions::default()) {
            Err(ConfigError::UnknownValidator { key, known }) => {
                assert_eq!(key, "xeipuuv");
                assert_eq!(known.len(), 2);
            }
            Err(other) => panic!("Expected UnknownValidator, got {:?}", other),
            Ok(_) => panic!("Expected UnknownValidator"),
        }
    }

    #[test]
    fn test_missing_selection_is_fatal() {
        let registry = AdapterRegistry::with_defaults();
        let config = HarnessConfig {
            validator: Some("  ".to_string()),
            ..HarnessConfig::default()
        };
        assert!(matches!(
            registry.from_config(&config),
            Err(ConfigError::MissingValidator { .. })
        ));
    }

    #[test]
    fn test_from_config_selects_adapter() {
        let registry = AdapterRegistry::with_defaults();
        let config = HarnessConfig {
            validator: Some("boon".to_string()),
            ..HarnessConfig::default()
        };
        assert_eq!(registry.from_config(&config).unwrap().name(), "boon");
    }
}
