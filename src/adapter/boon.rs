//! Adapter for the `boon` crate.

use super::{ValidatorAdapter, no_schema_loaded};
use crate::config::{AdapterOptions, Draft};
use crate::error::CompileError;
use crate::remote::fetch_json;
use ::boon::{Compiler, SchemaIndex, Schemas, SchemeUrlLoader, UrlLoader};
use log::{debug, warn};
use serde_json::Value;

const ENGINE: &str = "boon";

/// Location the schema under test is registered at. Relative references
/// without an `$id` resolve against it.
const SCHEMA_URL: &str = "file:///schema-bench/schema.json";

/// Resolves `http` and `https` references for `boon`.
struct HttpLoader;

impl UrlLoader for HttpLoader {
    fn load(&self, url: &str) -> Result<Value, Box<dyn std::error::Error>> {
        fetch_json(url).map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }
}

struct Compiled {
    schemas: Schemas,
    index: SchemaIndex,
}

/// Drives `boon`. Each load builds a fresh compiler and schema store.
pub struct BoonAdapter {
    options: AdapterOptions,
    compiled: Option<Compiled>,
}

impl BoonAdapter {
    pub fn new(options: &AdapterOptions) -> Self {
        if !options.validate_formats && formats_always_asserted(options.draft) {
            warn!(
                "boon always asserts `format` for {:?} schemas; validate_formats=false has no effect",
                options.draft
            );
        }
        Self {
            options: *options,
            compiled: None,
        }
    }

    fn compiled(&self) -> &Compiled {
        match &self.compiled {
            Some(compiled) => compiled,
            None => no_schema_loaded(ENGINE),
        }
    }

    fn compiler(&self) -> Compiler {
        let mut loader = SchemeUrlLoader::new();
        loader.register("http", Box::new(HttpLoader));
        loader.register("https", Box::new(HttpLoader));

        let mut compiler = Compiler::new();
        compiler.use_loader(Box::new(loader));
        compiler.set_default_draft(engine_draft(self.options.draft));
        if self.options.validate_formats {
            compiler.enable_format_assertions();
        }
        compiler
    }
}

/// boon treats `format` as an assertion for draft-07 and earlier whatever
/// the compiler settings say; only later drafts can make it an annotation.
fn formats_always_asserted(draft: Draft) -> bool {
    matches!(draft, Draft::Draft4 | Draft::Draft6 | Draft::Draft7)
}

fn engine_draft(draft: Draft) -> ::boon::Draft {
    match draft {
        Draft::Draft4 => ::boon::Draft::V4,
        Draft::Draft6 => ::boon::Draft::V6,
        Draft::Draft7 => ::boon::Draft::V7,
        Draft::Draft201909 => ::boon::Draft::V2019_09,
        Draft::Draft202012 => ::boon::Draft::V2020_12,
    }
}

impl ValidatorAdapter for BoonAdapter {
    fn name(&self) -> &'static str {
        ENGINE
    }

    fn load_schema(&mut self, raw_schema: &[u8]) -> Result<(), CompileError> {
        self.compiled = None;

        let schema: Value = serde_json::from_slice(raw_schema)?;
        let mut compiler = self.compiler();
        let mut schemas = Schemas::new();

        compiler
            .add_resource(SCHEMA_URL, schema)
            .map_err(|e| CompileError::rejected(ENGINE, e.to_string()))?;
        let index = compiler
            .compile(SCHEMA_URL, &mut schemas)
            .map_err(|e| CompileError::rejected(ENGINE, e.to_string()))?;

        self.compiled = Some(Compiled { schemas, index });
        Ok(())
    }

    fn valid_json(&self, raw_document: &[u8]) -> bool {
        let compiled = self.compiled();
        match serde_json::from_slice::<Value>(raw_document) {
            Ok(value) => compiled.schemas.validate(&value, compiled.index).is_ok(),
            Err(e) => {
                debug!("Document is not JSON: {}", e);
                false
            }
        }
    }

    fn valid_value(&self, value: &Value) -> bool {
        let compiled = self.compiled();
        compiled.schemas.validate(value, compiled.index).is_ok()
    }
}
