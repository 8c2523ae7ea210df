//! Blocking HTTP retrieval of remote schema documents.

use log::debug;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while fetching a remote document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unsupported scheme in '{0}'")]
    UnsupportedScheme(String),

    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

fn client() -> Result<&'static reqwest::blocking::Client, reqwest::Error> {
    static CLIENT: OnceLock<reqwest::blocking::Client> = OnceLock::new();
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    Ok(CLIENT.get_or_init(|| client))
}

/// Fetch `url` and decode the body as JSON.
///
/// Only `http` and `https` are supported. Any non-success status is an
/// error, so a missing remote fails schema compilation instead of being
/// treated as an empty schema.
pub fn fetch_json(url: &str) -> Result<Value, FetchError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(FetchError::UnsupportedScheme(url.to_string()));
    }

    // Fragments are resolved by the engine, never sent to the server.
    let target = url.split('#').next().unwrap_or(url);
    debug!("Fetching remote schema {}", target);

    let request_error = |source| FetchError::Request {
        url: target.to_string(),
        source,
    };

    let response = client()
        .map_err(request_error)?
        .get(target)
        .send()
        .map_err(request_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: target.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<Value>().map_err(request_error)
}
