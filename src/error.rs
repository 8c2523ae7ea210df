//! Error types for the conformance and benchmark harness.
//!
//! Errors are split by the unit of work they invalidate: a fixture file
//! ([`FixtureError`]), a test group ([`CompileError`]), a single case or
//! benchmark iteration ([`InternalFault`]), a benchmark case ([`BenchError`])
//! or the whole process ([`ConfigError`]). [`HarnessError`] wraps all of them
//! for callers that only need to propagate.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Main error type for harness operations.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A fixture directory or file could not be read or decoded
    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),

    /// A schema failed to compile in an adapter
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// A validation engine faulted while running
    #[error("Internal fault: {0}")]
    Fault(#[from] InternalFault),

    /// Invalid external configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A benchmark case failed
    #[error("Benchmark error: {0}")]
    Bench(#[from] BenchError),
}

/// Errors raised while listing or decoding fixture files.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("fixture directory not found: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to list fixture directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read fixture file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode fixture file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A schema could not be compiled by an adapter.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The raw schema bytes are not a JSON document
    #[error("schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The engine refused the schema or could not resolve one of its references
    #[error("{engine} rejected schema: {message}")]
    Rejected {
        engine: &'static str,
        message: String,
    },
}

impl CompileError {
    /// Create a rejection error for the named engine
    pub fn rejected(engine: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            engine,
            message: message.into(),
        }
    }
}

/// Operation of the adapter contract that faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadSchema,
    ValidJson,
    ValidValue,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::LoadSchema => "load_schema",
            Operation::ValidJson => "valid_json",
            Operation::ValidValue => "valid_value",
        };
        f.write_str(name)
    }
}

/// An unexpected fault inside a validation engine, captured at the smallest
/// enclosing unit (one case or one benchmark iteration).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} faulted: {message}")]
pub struct InternalFault {
    pub operation: Operation,
    pub message: String,
}

/// Invalid external configuration. Always fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no validator selected (set VALIDATOR or pass --validator); known validators: {}", known.join(", "))]
    MissingValidator { known: Vec<String> },

    #[error("unknown validator '{key}'; known validators: {}", known.join(", "))]
    UnknownValidator { key: String, known: Vec<String> },

    #[error("fixture directory is not reachable: {}", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("remote schema server could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown draft '{0}'")]
    InvalidDraft(String),

    #[error("unknown validation mode '{0}', expected 'json' or 'value'")]
    InvalidMode(String),

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// A benchmark case failed. Any of these invalidates the measurement.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("verdict mismatch at iteration {iteration}: expected valid={expected}, got valid={actual}")]
    Mismatch {
        iteration: u64,
        expected: bool,
        actual: bool,
    },

    #[error("failed to decode test data: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error("schema failed to compile: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Fault(#[from] InternalFault),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
