//! Remote schema resolution.
//!
//! Test vectors that exercise remote `$ref`s point at
//! `http://localhost:1234/...`. [`RemoteSchemaServer`] serves the suite's
//! `remotes/` directory at that address, and [`fetch_json`] is what the
//! adapters use to retrieve those documents while compiling.
//!
//! The server must be listening before any such schema is compiled.
//! [`RemoteSchemaServer::start`] only returns once the listener is bound, so
//! start-up order is checked rather than assumed.

pub mod fetch;
pub mod server;

pub use fetch::{fetch_json, FetchError};
pub use server::{RemoteSchemaServer, RemoteServerHandle};
