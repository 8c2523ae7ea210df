//! Harness configuration.
//!
//! [`HarnessConfig`] gathers everything a run needs from outside the crate:
//! which adapter to drive, which fixture directories to walk, where the
//! remote schema server lives and how long benchmark loops run for. The
//! binary fills it from command-line flags and environment variables; tests
//! build it directly.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default address of the remote schema server. The JSON Schema Test Suite
/// remotes are referenced as `http://localhost:1234/...`.
pub const DEFAULT_REMOTE_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 1234);

/// Default directory served by the remote schema server.
pub const DEFAULT_REMOTE_ROOT: &str = "spec/JSON-Schema-Test-Suite/remotes";

/// Default fixture directories: the draft-7 suite and the ajv corpus.
pub const DEFAULT_SUITES: &[&str] = &[
    "spec/JSON-Schema-Test-Suite/tests/draft7",
    "spec/JSON-Schema-Test-Suite/tests/draft7/optional",
    "spec/JSON-Schema-Test-Suite/tests/draft7/optional/format",
    "spec/ajv/spec/tests/schemas",
];

/// JSON Schema draft assumed for schemas without `$schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Draft {
    #[serde(rename = "draft4")]
    Draft4,
    #[serde(rename = "draft6")]
    Draft6,
    #[serde(rename = "draft7")]
    Draft7,
    #[serde(rename = "draft2019-09")]
    Draft201909,
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

impl Default for Draft {
    fn default() -> Self {
        Draft::Draft7
    }
}

impl FromStr for Draft {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft4" | "4" => Ok(Draft::Draft4),
            "draft6" | "6" => Ok(Draft::Draft6),
            "draft7" | "7" => Ok(Draft::Draft7),
            "draft2019-09" | "2019-09" => Ok(Draft::Draft201909),
            "draft2020-12" | "2020-12" => Ok(Draft::Draft202012),
            _ => Err(ConfigError::InvalidDraft(s.to_string())),
        }
    }
}

/// How a document is handed to the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Raw serialized bytes through `valid_json`
    Json,
    /// Pre-decoded value through `valid_value`
    Value,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Json => "json",
            ValidationMode::Value => "value",
        }
    }
}

impl std::fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ValidationMode::Json),
            "value" => Ok(ValidationMode::Value),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

/// Options handed to adapter constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOptions {
    /// Draft used when a schema does not declare `$schema`
    pub draft: Draft,
    /// Whether `format` is asserted rather than treated as an annotation.
    /// On by default: the default suites include `optional/format`.
    pub validate_formats: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            draft: Draft::default(),
            validate_formats: true,
        }
    }
}

/// Settings for the timed benchmark loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchSettings {
    /// Minimum wall time of the final timed round
    #[serde(with = "duration_millis")]
    pub min_time: Duration,
    /// Upper bound on iterations in one round
    pub max_iterations: u64,
    /// Loops to run for every case
    pub modes: Vec<ValidationMode>,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            min_time: Duration::from_millis(100),
            max_iterations: 1_000_000_000,
            modes: vec![ValidationMode::Json],
        }
    }
}

/// Configuration for one harness process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Registry key of the adapter to exercise
    pub validator: Option<String>,
    pub draft: Draft,
    /// Assert `format` keywords; needed by the `optional/format` suites
    pub validate_formats: bool,
    /// Directory exposed by the remote schema server
    pub remote_root: PathBuf,
    pub remote_addr: SocketAddr,
    /// Fixture directories, walked in order
    pub suites: Vec<PathBuf>,
    pub bench: BenchSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            validator: None,
            draft: Draft::default(),
            validate_formats: AdapterOptions::default().validate_formats,
            remote_root: PathBuf::from(DEFAULT_REMOTE_ROOT),
            remote_addr: DEFAULT_REMOTE_ADDR,
            suites: DEFAULT_SUITES.iter().map(PathBuf::from).collect(),
            bench: BenchSettings::default(),
        }
    }
}

impl HarnessConfig {
    /// Options passed to the selected adapter's constructor.
    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            draft: self.draft,
            validate_formats: self.validate_formats,
        }
    }

    /// Check that every configured directory is reachable.
    ///
    /// A missing fixture root is fatal: no smaller unit of work can continue
    /// without it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in self.suites.iter().chain(std::iter::once(&self.remote_root)) {
            if !dir.is_dir() {
                return Err(ConfigError::MissingDirectory { path: dir.clone() });
            }
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
