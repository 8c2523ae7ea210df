//! Static file server for remote schema fixtures.

use crate::error::ConfigError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, info, warn};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Serves a read-only directory over plain HTTP.
pub struct RemoteSchemaServer;

impl RemoteSchemaServer {
    /// Bind `addr` and start serving `root` on a background thread.
    ///
    /// Returns once the listener is bound, so references can be resolved as
    /// soon as this returns. Failing to bind is a [`ConfigError::Bind`]; the
    /// caller is expected to abort rather than run remote-reference vectors
    /// without a server.
    pub fn start<P: AsRef<Path>>(
        root: P,
        addr: SocketAddr,
    ) -> Result<RemoteServerHandle, ConfigError> {
        let root = root.as_ref().to_path_buf();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ConfigError::Runtime)?;

        let listener = runtime
            .block_on(TcpListener::bind(addr))
            .map_err(|e| ConfigError::Bind { addr, source: e })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ConfigError::Bind { addr, source: e })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let serve_root = Arc::new(root.clone());
        let thread = std::thread::Builder::new()
            .name("remote-schema-server".to_string())
            .spawn(move || runtime.block_on(serve(listener, serve_root, shutdown_rx)))
            .map_err(ConfigError::Runtime)?;

        info!(
            "Remote schema server serving {} on http://{}",
            root.display(),
            local_addr
        );

        Ok(RemoteServerHandle {
            local_addr,
            root,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Start the process-wide server once and return it on every later call.
    ///
    /// The server then lives until the process exits.
    pub fn ensure_global<P: AsRef<Path>>(
        root: P,
        addr: SocketAddr,
    ) -> Result<&'static RemoteServerHandle, ConfigError> {
        static GLOBAL: OnceLock<RemoteServerHandle> = OnceLock::new();
        static STARTING: Mutex<()> = Mutex::new(());

        let _guard = STARTING.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = GLOBAL.get() {
            if handle.root() != root.as_ref() {
                warn!(
                    "Remote schema server already serves {}, ignoring request for {}",
                    handle.root().display(),
                    root.as_ref().display()
                );
            }
            return Ok(handle);
        }

        let handle = Self::start(root, addr)?;
        Ok(GLOBAL.get_or_init(|| handle))
    }
}

/// A running server. Dropping the handle stops it.
#[derive(Debug)]
pub struct RemoteServerHandle {
    local_addr: SocketAddr,
    root: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RemoteServerHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL of `path` relative to the served root.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.local_addr, path.trim_start_matches('/'))
    }

    /// Stop accepting connections and wait for the server thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Remote schema server thread panicked");
            }
        }
    }
}

impl Drop for RemoteServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve(listener: TcpListener, root: Arc<PathBuf>, mut shutdown: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Remote schema server shutting down");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Remote schema server failed to accept: {}", e);
                        continue;
                    }
                };

                let root = root.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |request: Request<Incoming>| {
                        let root = root.clone();
                        let request = FileRequest::from_request(&request);
                        async move { Ok::<_, Infallible>(respond(&root, &request).await) }
                    });

                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("Connection from {} ended with error: {}", peer, e);
                    }
                });
            }
        }
    }
}

/// Map a request path onto a file under `root`.
///
/// Returns `None` for paths that are not valid UTF-8 once decoded or that
/// try to leave the root.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;

    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => path.push(s),
        }
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn status_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// The parts of a request the file server looks at.
#[derive(Debug, Clone)]
struct FileRequest {
    method: Method,
    path: String,
    if_modified_since: Option<DateTime<Utc>>,
}

impl FileRequest {
    fn from_request(request: &Request<Incoming>) -> Self {
        let if_modified_since = request
            .headers()
            .get(header::IF_MODIFIED_SINCE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
            .map(|since| since.with_timezone(&Utc));

        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            if_modified_since,
        }
    }

    /// Whether `If-Modified-Since` makes the response a 304.
    fn not_modified(&self, modified: Option<DateTime<Utc>>) -> bool {
        match (modified, self.if_modified_since) {
            (Some(modified), Some(since)) => modified.timestamp() <= since.timestamp(),
            _ => false,
        }
    }
}

async fn respond(root: &Path, request: &FileRequest) -> Response<Full<Bytes>> {
    let is_head = request.method == Method::HEAD;
    if request.method != Method::GET && !is_head {
        let mut response = status_response(StatusCode::METHOD_NOT_ALLOWED);
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        return response;
    }

    let Some(path) = resolve_path(root, &request.path) else {
        debug!("Rejected request path {}", request.path);
        return status_response(StatusCode::BAD_REQUEST);
    };

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => {
            debug!("No remote schema at {}", path.display());
            return status_response(StatusCode::NOT_FOUND);
        }
    };

    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let mut response = if request.not_modified(modified) {
        status_response(StatusCode::NOT_MODIFIED)
    } else {
        let body = if is_head {
            Bytes::new()
        } else {
            match tokio::fs::read(&path).await {
                Ok(content) => Bytes::from(content),
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    return status_response(StatusCode::INTERNAL_SERVER_ERROR);
                }
            }
        };

        let mut response = Response::new(Full::new(body));
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type(&path)),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
        response
    };

    if let Some(modified) = modified {
        if let Ok(value) = HeaderValue::from_str(&modified.format(HTTP_DATE_FORMAT).to_string()) {
            response.headers_mut().insert(header::LAST_MODIFIED, value);
        }
    }

    debug!("{} {} -> {}", request.method, request.path, response.status());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn local() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    fn remotes() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("integer.json"), r#"{"type": "integer"}"#).unwrap();
        fs::create_dir(temp.path().join("baseUriChange")).unwrap();
        fs::write(
            temp.path().join("baseUriChange").join("folderInteger.json"),
            r#"{"type": "integer"}"#,
        )
        .unwrap();
        temp
    }

    #[test]
    fn test_resolve_path_rejects_traversal() {
        let root = Path::new("/srv/remotes");
        assert_eq!(
            resolve_path(root, "/baseUriChange/folderInteger.json"),
            Some(root.join("baseUriChange").join("folderInteger.json"))
        );
        assert_eq!(resolve_path(root, "/a/../../etc/passwd"), None);
        assert_eq!(resolve_path(root, "/%2e%2e/secret"), None);
        assert_eq!(resolve_path(root, "/name%20with%20space.json"), Some(root.join("name with space.json")));
    }

    #[test]
    fn test_serves_files() {
        let temp = remotes();
        let server = RemoteSchemaServer::start(temp.path(), local()).unwrap();

        let response = reqwest::blocking::get(server.url("integer.json")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE.as_str()],
            "application/json"
        );
        assert!(response.headers().contains_key(header::LAST_MODIFIED.as_str()));
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body, serde_json::json!({"type": "integer"}));

        let nested = reqwest::blocking::get(server.url("/baseUriChange/folderInteger.json")).unwrap();
        assert_eq!(nested.status(), 200);
    }

    #[test]
    fn test_missing_files_and_directories_are_not_found() {
        let temp = remotes();
        let server = RemoteSchemaServer::start(temp.path(), local()).unwrap();

        let missing = reqwest::blocking::get(server.url("nope.json")).unwrap();
        assert_eq!(missing.status(), 404);

        let directory = reqwest::blocking::get(server.url("baseUriChange")).unwrap();
        assert_eq!(directory.status(), 404);
    }

    #[test]
    fn test_conditional_get() {
        let temp = remotes();
        let server = RemoteSchemaServer::start(temp.path(), local()).unwrap();
        let client = reqwest::blocking::Client::new();

        let first = client.get(server.url("integer.json")).send().unwrap();
        let last_modified = first.headers()[header::LAST_MODIFIED.as_str()]
            .to_str()
            .unwrap()
            .to_string();

        let second = client
            .get(server.url("integer.json"))
            .header(header::IF_MODIFIED_SINCE.as_str(), last_modified)
            .send()
            .unwrap();
        assert_eq!(second.status(), 304);

        let stale = client
            .get(server.url("integer.json"))
            .header(header::IF_MODIFIED_SINCE.as_str(), "Thu, 01 Jan 1970 00:00:00 GMT")
            .send()
            .unwrap();
        assert_eq!(stale.status(), 200);
    }

    #[test]
    fn test_head_and_method_not_allowed() {
        let temp = remotes();
        let server = RemoteSchemaServer::start(temp.path(), local()).unwrap();
        let client = reqwest::blocking::Client::new();

        let head = client.head(server.url("integer.json")).send().unwrap();
        assert_eq!(head.status(), 200);
        assert_eq!(head.headers()[header::CONTENT_LENGTH.as_str()], "19");

        let post = client.post(server.url("integer.json")).send().unwrap();
        assert_eq!(post.status(), 405);
    }

    #[test]
    fn test_bind_failure_is_config_error() {
        let temp = remotes();
        let first = RemoteSchemaServer::start(temp.path(), local()).unwrap();

        match RemoteSchemaServer::start(temp.path(), first.local_addr()) {
            Err(ConfigError::Bind { addr, .. }) => assert_eq!(addr, first.local_addr()),
            other => panic!("Expected Bind error, got {:?}", other.map(|h| h.local_addr())),
        }
    }

    #[test]
    fn test_shutdown_stops_listener() {
        let temp = remotes();
        let server = RemoteSchemaServer::start(temp.path(), local()).unwrap();
        let url = server.url("integer.json");
        server.shutdown();

        assert!(reqwest::blocking::get(url).is_err());
    }
}
