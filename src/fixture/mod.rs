//! Fixture loading for suite-format test corpora.
//!
//! A fixture directory holds one JSON file per keyword or topic. Each file is
//! an ordered array of test groups; each group carries one schema and the
//! documents to validate against it:
//!
//! ```json
//! [
//!   {
//!     "description": "integer type",
//!     "schema": {"type": "integer"},
//!     "tests": [
//!       {"description": "an integer", "data": 4, "valid": true},
//!       {"description": "a string", "data": "not a number", "valid": false}
//!     ]
//!   }
//! ]
//! ```
//!
//! Schemas and data are kept as raw JSON text so adapters receive the exact
//! bytes from the corpus.

pub mod loader;
pub mod types;

pub use loader::{load_dir, load_file, DirectoryLoad};
pub use types::{FixtureFile, TestCase, TestGroup};
