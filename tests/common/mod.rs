//! Shared helpers for the integration tests.

#![allow(dead_code)]

use schema_bench::{AdapterOptions, AdapterRegistry, ValidatorAdapter};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the checked-in fixture trees.
pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn suite_dir() -> PathBuf {
    fixtures().join("suite")
}

pub fn remotes_dir() -> PathBuf {
    fixtures().join("remotes")
}

/// Every registered adapter, constructed with default options.
pub fn all_adapters() -> Vec<Box<dyn ValidatorAdapter>> {
    let registry = AdapterRegistry::with_defaults();
    registry
        .keys()
        .iter()
        .map(|key| registry.create(key, &AdapterOptions::default()).unwrap())
        .collect()
}

/// Write `contents` as `name` inside `dir`.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
