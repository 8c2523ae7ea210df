//! Adapter for the `jsonschema` crate.

use super::{ValidatorAdapter, no_schema_loaded};
use crate::config::{AdapterOptions, Draft};
use crate::error::CompileError;
use crate::remote::fetch_json;
use jsonschema::{Retrieve, Uri, Validator};
use log::debug;
use serde_json::Value;

const ENGINE: &str = "jsonschema";

/// Resolves remote references over HTTP for `jsonschema`.
struct HttpRetriever;

impl Retrieve for HttpRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        fetch_json(uri.as_str()).map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

/// Drives [`jsonschema::Validator`].
///
/// The engine only accepts decoded values, so `valid_json` pays for a parse
/// on every call.
pub struct JsonschemaAdapter {
    options: AdapterOptions,
    compiled: Option<Validator>,
}

impl JsonschemaAdapter {
    pub fn new(options: &AdapterOptions) -> Self {
        Self {
            options: *options,
            compiled: None,
        }
    }

    fn compiled(&self) -> &Validator {
        match &self.compiled {
            Some(validator) => validator,
            None => no_schema_loaded(ENGINE),
        }
    }
}

fn engine_draft(draft: Draft) -> jsonschema::Draft {
    match draft {
        Draft::Draft4 => jsonschema::Draft::Draft4,
        Draft::Draft6 => jsonschema::Draft::Draft6,
        Draft::Draft7 => jsonschema::Draft::Draft7,
        Draft::Draft201909 => jsonschema::Draft::Draft201909,
        Draft::Draft202012 => jsonschema::Draft::Draft202012,
    }
}

impl ValidatorAdapter for JsonschemaAdapter {
    fn name(&self) -> &'static str {
        ENGINE
    }

    fn load_schema(&mut self, raw_schema: &[u8]) -> Result<(), CompileError> {
        self.compiled = None;

        let schema: Value = serde_json::from_slice(raw_schema)?;
        let validator = jsonschema::options()
            .with_draft(engine_draft(self.options.draft))
            .should_validate_formats(self.options.validate_formats)
            .with_retriever(HttpRetriever)
            .build(&schema)
            .map_err(|e| CompileError::rejected(ENGINE, e.to_string()))?;

        self.compiled = Some(validator);
        Ok(())
    }

    fn valid_json(&self, raw_document: &[u8]) -> bool {
        let validator = self.compiled();
        match serde_json::from_slice::<Value>(raw_document) {
            Ok(value) => validator.is_valid(&value),
            Err(e) => {
                debug!("Document is not JSON: {}", e);
                false
            }
        }
    }

    fn valid_value(&self, value: &Value) -> bool {
        self.compiled().is_valid(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> JsonschemaAdapter {
        JsonschemaAdapter::new(&AdapterOptions::default())
    }

    #[test]
    fn test_integer_schema() {
        let mut adapter = adapter();
        adapter.load_schema(br#"{"type": "integer"}"#).unwrap();

        assert!(adapter.valid_json(b"4"));
        assert!(!adapter.valid_json(br#""not a number""#));
        assert!(adapter.valid_value(&json!(4)));
        assert!(!adapter.valid_value(&json!("not a number")));
    }

    #[test]
    fn test_malformed_document_is_not_valid() {
        let mut adapter = adapter();
        adapter.load_schema(b"{}").unwrap();

        assert!(!adapter.valid_json(b"{not json"));
    }

    #[test]
    fn test_rejected_schema_clears_previous() {
        let mut adapter = adapter();
        adapter.load_schema(br#"{"type": "integer"}"#).unwrap();

        let result = adapter.load_schema(br#"{"type": 12}"#);
        assert!(matches!(result, Err(CompileError::Rejected { .. })));
        assert!(adapter.compiled.is_none());
    }

    #[test]
    fn test_non_json_schema() {
        let mut adapter = adapter();
        assert!(matches!(
            adapter.load_schema(b"{\"type\""),
            Err(CompileError::Parse(_))
        ));
    }

    #[test]
    #[should_panic(expected = "before a schema was loaded")]
    fn test_validate_without_schema_panics() {
        adapter().valid_json(b"1");
    }

    #[test]
    fn test_format_assertion_follows_options() {
        let schema = br#"{"format": "ipv4"}"#;

        let mut lenient = JsonschemaAdapter::new(&AdapterOptions {
            validate_formats: false,
            ..AdapterOptions::default()
        });
        lenient.load_schema(schema).unwrap();
        assert!(lenient.valid_json(br#""not an address""#));

        let mut strict = adapter();
        strict.load_schema(schema).unwrap();
        assert!(!strict.valid_json(br#""not an address""#));
        assert!(strict.valid_json(br#""127.0.0.1""#));
    }
}
