//! Conformance and benchmark harness for JSON Schema validators.
//!
//! Drives independent validation engines through the same suite-format
//! corpora (the JSON Schema Test Suite and the ajv test schemas), reporting
//! a verdict per test case and per-operation throughput.
//!
//! # Core Components
//!
//! - [`fixture`] - Loads suite-format fixture directories
//! - [`ValidatorAdapter`] - Three-operation contract every engine is wrapped in
//! - [`AdapterRegistry`] - Maps a validator key to an adapter constructor
//! - [`ConformanceRunner`] - Checks every case's verdict, isolating failures
//! - [`BenchmarkRunner`] - Times raw-bytes and pre-decoded validation loops
//! - [`RemoteSchemaServer`] - Serves remote `$ref` targets over HTTP
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use schema_bench::{AdapterRegistry, ConformanceRunner, HarnessConfig, RemoteSchemaServer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig {
//!     validator: Some("jsonschema".to_string()),
//!     ..HarnessConfig::default()
//! };
//! config.validate()?;
//!
//! let _server = RemoteSchemaServer::start(&config.remote_root, config.remote_addr)?;
//! let mut adapter = AdapterRegistry::with_defaults().from_config(&config)?;
//!
//! let report = ConformanceRunner::new(adapter.as_mut()).run_dirs(&config.suites)?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod alloc;
pub mod config;
pub mod error;
pub mod fixture;
pub mod remote;
pub mod runner;

// Re-export commonly used types for convenience
pub use adapter::{AdapterRegistry, ValidatorAdapter};
pub use config::{AdapterOptions, BenchSettings, Draft, HarnessConfig, ValidationMode};
pub use error::{
    BenchError, CompileError, ConfigError, FixtureError, HarnessError, HarnessResult,
    InternalFault,
};
pub use fixture::{FixtureFile, TestCase, TestGroup};
pub use remote::{RemoteSchemaServer, RemoteServerHandle};
pub use runner::{
    BenchReport, BenchmarkRunner, ConformanceReport, ConformanceRunner, Measurement, Verdict,
};
