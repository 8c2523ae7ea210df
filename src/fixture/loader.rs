//! Fixture loading utilities.
//!
//! Directory scans are non-recursive and visit regular files in file-name
//! order. A file that cannot be read or decoded is reported on its own entry
//! without stopping the scan; only a directory that cannot be listed fails
//! the whole load.

use super::types::{FixtureFile, TestGroup};
use crate::error::FixtureError;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of loading one file from a fixture directory.
#[derive(Debug)]
pub struct FileEntry {
    pub name: String,
    pub result: Result<FixtureFile, FixtureError>,
}

/// Every regular file of a fixture directory, in file-name order.
#[derive(Debug)]
pub struct DirectoryLoad {
    pub dir: PathBuf,
    pub entries: Vec<FileEntry>,
}

impl DirectoryLoad {
    /// Files that decoded successfully.
    pub fn files(&self) -> impl Iterator<Item = &FixtureFile> {
        self.entries.iter().filter_map(|entry| entry.result.as_ref().ok())
    }

    /// Files that were rejected, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FixtureError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().err().map(|e| (entry.name.as_str(), e)))
    }

    /// Returns the first rejected file's error, if any.
    ///
    /// Benchmarks use this: a corpus that does not decode cleanly cannot
    /// produce a meaningful measurement.
    pub fn into_files(self) -> Result<Vec<FixtureFile>, FixtureError> {
        self.entries.into_iter().map(|entry| entry.result).collect()
    }
}

/// Load every regular file in `dir`.
///
/// Subdirectories are skipped. Fails only if the directory itself cannot be
/// listed.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<DirectoryLoad, FixtureError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(FixtureError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let read_dir = fs::read_dir(dir).map_err(|e| FixtureError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| FixtureError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        } else {
            debug!("Skipping non-file entry {}", path.display());
        }
    }
    paths.sort();

    let entries = paths
        .into_iter()
        .map(|path| {
            let name = file_name(&path);
            let result = load_file(&path);
            if let Err(e) = &result {
                warn!("Rejected fixture file {}: {}", name, e);
            }
            FileEntry { name, result }
        })
        .collect();

    Ok(DirectoryLoad {
        dir: dir.to_path_buf(),
        entries,
    })
}

/// Load the test groups of a single fixture file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FixtureFile, FixtureError> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(|e| FixtureError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let groups: Vec<TestGroup> =
        serde_json::from_slice(&content).map_err(|e| FixtureError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!("Loaded {} groups from {}", groups.len(), path.display());

    Ok(FixtureFile {
        name: file_name(path),
        groups,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
