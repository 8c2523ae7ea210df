//! Validator adapter contract.
//!
//! Every validation engine is driven through [`ValidatorAdapter`], so the
//! runners never see a concrete engine type. An adapter owns at most one
//! compiled schema at a time; loading a new schema replaces it.
//!
//! # Contract
//!
//! - [`load_schema`](ValidatorAdapter::load_schema) compiles raw schema bytes
//!   and must not keep a borrow of them. A failed load leaves the adapter with
//!   no schema.
//! - [`valid_json`](ValidatorAdapter::valid_json) validates raw serialized
//!   bytes, parsing them on every call.
//! - [`valid_value`](ValidatorAdapter::valid_value) validates an already
//!   decoded value, so benchmarks can separate parse cost from validation
//!   cost.
//!
//! Calling either validation method before a successful load is a contract
//! violation and panics. The runners convert such panics into
//! [`InternalFault`](crate::error::InternalFault)s scoped to one case.
//!
//! # Example
//!
//! ```rust,no_run
//! use schema_bench::adapter::{AdapterRegistry, ValidatorAdapter};
//! use schema_bench::config::AdapterOptions;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AdapterRegistry::with_defaults();
//! let mut adapter = registry.create("boon", &AdapterOptions::default())?;
//!
//! adapter.load_schema(br#"{"type": "integer"}"#)?;
//! assert!(adapter.valid_json(b"4"));
//! assert!(!adapter.valid_value(&serde_json::json!("not a number")));
//! # Ok(())
//! # }
//! ```

pub mod boon;
pub mod jsonschema_rs;
pub mod registry;

pub use self::boon::BoonAdapter;
pub use jsonschema_rs::JsonschemaAdapter;
pub use registry::{AdapterConstructor, AdapterRegistry};

use crate::error::CompileError;
use serde_json::Value;

/// Uniform interface over one validation engine.
pub trait ValidatorAdapter {
    /// Registry key of the engine behind this adapter.
    fn name(&self) -> &'static str;

    /// Compile `raw_schema`, replacing any previously loaded schema.
    fn load_schema(&mut self, raw_schema: &[u8]) -> Result<(), CompileError>;

    /// Whether the raw serialized document conforms to the loaded schema.
    ///
    /// Bytes that are not a JSON document do not conform.
    ///
    /// # Panics
    ///
    /// Panics if no schema is loaded.
    fn valid_json(&self, raw_document: &[u8]) -> bool;

    /// Whether the decoded value conforms to the loaded schema.
    ///
    /// # Panics
    ///
    /// Panics if no schema is loaded.
    fn valid_value(&self, value: &Value) -> bool;
}

impl<A: ValidatorAdapter + ?Sized> ValidatorAdapter for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn load_schema(&mut self, raw_schema: &[u8]) -> Result<(), CompileError> {
        (**self).load_schema(raw_schema)
    }

    fn valid_json(&self, raw_document: &[u8]) -> bool {
        (**self).valid_json(raw_document)
    }

    fn valid_value(&self, value: &Value) -> bool {
        (**self).valid_value(value)
    }
}

/// Panic raised when an adapter is asked to validate with nothing loaded.
pub(crate) fn no_schema_loaded(engine: &str) -> ! {
    panic!("{engine} adapter used before a schema was loaded")
}
