//! In-memory representation of fixture files.

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

/// A single document with its expected verdict.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub description: String,
    pub data: Box<RawValue>,
    #[serde(rename = "valid")]
    pub expected_valid: bool,
}

impl TestCase {
    /// Raw serialized document, exactly as it appears in the fixture.
    pub fn data_bytes(&self) -> &[u8] {
        self.data.get().as_bytes()
    }

    /// Decode the document into a value for `valid_value`.
    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(self.data.get())
    }
}

/// A schema together with the cases run against it.
#[derive(Debug, Clone, Deserialize)]
pub struct TestGroup {
    pub description: String,
    pub schema: Box<RawValue>,
    #[serde(rename = "tests")]
    pub cases: Vec<TestCase>,
}

impl TestGroup {
    /// Raw serialized schema, exactly as it appears in the fixture.
    pub fn schema_bytes(&self) -> &[u8] {
        self.schema.get().as_bytes()
    }
}

/// The groups decoded from one file. The name only labels results.
#[derive(Debug, Clone)]
pub struct FixtureFile {
    pub name: String,
    pub groups: Vec<TestGroup>,
}

impl FixtureFile {
    /// Total number of cases across all groups.
    pub fn case_count(&self) -> usize {
        self.groups.iter().map(|group| group.cases.len()).sum()
    }
}
