// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request builder and executor

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use base64::Engine;
use bytes::Bytes;
use reqwest::Method;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use super::headers::{AUTHORIZATION, CONTENT_TYPE};
use super::multipart::MultipartForm;
use super::query::append_query;
use super::response::Response;
use super::{DEFAULT_TIMEOUT_MS, FORM_URLENCODED};
use crate::error::{Error, Result};
use crate::transport::{Payload, PreparedRequest, ReqwestTransport, TlsVerification, Transport};

/// HTTP request builder
///
/// Options are accumulated through chained calls and applied when the
/// request is sent. Sending never fails: a transport failure produces a
/// `Response` with status 0 whose body describes the failure.
///
/// ```rust,no_run
/// use xreq::Request;
///
/// let response = Request::new("https://example.com/search")
///     .param("q", "rust http")
///     .header("Accept", "text/html")
///     .timeout(5000)
///     .send();
///
/// if response.status_code == 0 {
///     eprintln!("request failed: {}", response.text_lossy());
/// }
/// ```
///
/// A request is not meant to be shared between threads while it is being
/// sent; `send_async` takes it by value for that reason.
#[derive(Debug, Clone)]
pub struct Request {
    url: String,
    headers: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    body: Option<Bytes>,
    form: Option<MultipartForm>,
    timeout_ms: i64,
    verify_ssl: bool,
    cookie_file: Option<PathBuf>,
    transport: Arc<dyn Transport>,
}

impl Request {
    /// Create a request for `url` using the default transport
    ///
    /// The URL is not validated until it is sent.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with(url, Arc::new(ReqwestTransport::default()))
    }

    /// Create a request for `url` executed by `transport`
    pub fn with(url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            body: None,
            form: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            verify_ssl: true,
            cookie_file: None,
            transport,
        }
    }

    /// Send a GET request to `url` with default options
    pub fn get(url: impl Into<String>) -> Response {
        Self::new(url).send()
    }

    /// Send `data` to `url` as an urlencoded form body
    ///
    /// Accepts anything viewable as bytes, so borrowed `&str`, `&[u8]` and
    /// `&String` all work; the data is copied.
    pub fn post(url: impl Into<String>, data: impl AsRef<[u8]>) -> Response {
        Self::form_post(url, data).send()
    }

    fn form_post(url: impl Into<String>, data: impl AsRef<[u8]>) -> Self {
        Self::new(url).body(Bytes::copy_from_slice(data.as_ref()), FORM_URLENCODED)
    }

    /// Replace the transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Set a header, replacing any earlier value for the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a query parameter, replacing any earlier value for the same name
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the timeout in milliseconds
    ///
    /// The value is handed to the transport unchanged. The default transport
    /// treats zero or a negative value as "no timeout".
    pub fn timeout(mut self, ms: i64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Disable (`true`) or restore (`false`) peer and host certificate checks
    pub fn insecure(mut self, enable: bool) -> Self {
        self.verify_ssl = !enable;
        self
    }

    /// Load cookies from and save them to `path`
    ///
    /// Once the URL is accepted, the jar is written back after every send,
    /// including failed ones, so the file always ends up in Netscape format.
    pub fn cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = Some(path.into());
        self
    }

    /// Set the raw body and its `Content-Type`
    ///
    /// Ignored when any file part has been added with [`Request::file`].
    pub fn body(mut self, data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = Some(data.into());
        self.header(CONTENT_TYPE, content_type)
    }

    /// Add a file upload; the file is read when the request is sent
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.form
            .get_or_insert_with(MultipartForm::new)
            .add_file(field, path);
        self
    }

    /// Set HTTP basic credentials
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        self.header(AUTHORIZATION, format!("Basic {}", encoded))
    }

    /// Set a bearer token
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header(AUTHORIZATION, format!("Bearer {}", token))
    }

    /// The URL as given, without query parameters
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Transfer timeout in milliseconds, `<= 0` meaning none
    pub fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    /// Whether peer and host verification are enabled
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// The URL that will be requested, including encoded query parameters
    ///
    /// Computed on demand; the stored URL never changes, so sending the same
    /// request twice requests the same URL twice.
    pub fn effective_url(&self) -> String {
        append_query(&self.url, &self.params)
    }

    /// Resolve every option into what the transport will execute
    pub fn prepare(&self) -> PreparedRequest {
        let payload = match (&self.form, &self.body) {
            (Some(form), _) => Payload::Multipart(form.clone()),
            (None, Some(body)) if !body.is_empty() => Payload::Raw(body.clone()),
            _ => Payload::Empty,
        };

        // The multipart encoder writes its own Content-Type with the boundary
        let multipart = matches!(payload, Payload::Multipart(_));
        let headers = self
            .headers
            .iter()
            .filter(|(name, _)| !(multipart && name.eq_ignore_ascii_case(CONTENT_TYPE)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let method = if payload.is_empty() {
            Method::GET
        } else {
            Method::POST
        };

        PreparedRequest {
            method,
            url: self.effective_url(),
            headers,
            payload,
            timeout_ms: self.timeout_ms,
            tls: if self.verify_ssl {
                TlsVerification::strict()
            } else {
                TlsVerification::disabled()
            },
            cookie_file: self.cookie_file.clone(),
        }
    }

    /// Execute the request, blocking until the exchange finishes
    ///
    /// Must not be called from inside an async task when using the default
    /// transport; use [`Request::send_async`] there.
    pub fn send(&self) -> Response {
        let prepared = self.prepare();
        let mut response = Response::new();
        debug!(method = %prepared.method, url = %prepared.url, "sending request");

        match self.transport.perform(&prepared, &mut response) {
            Ok(status) => {
                response.status_code = status;
                debug!(
                    url = %prepared.url,
                    status,
                    bytes = response.body.len(),
                    "request complete"
                );
            }
            Err(err) => {
                warn!(url = %prepared.url, error = %err, "request failed");
                response.body = err.to_string().into_bytes();
            }
        }

        response
    }

    /// Execute the request on a dedicated worker thread
    ///
    /// Returns immediately. The handle can be awaited or waited on; a panic on
    /// the worker comes back as [`Error::Task`].
    pub fn send_async(self) -> PendingResponse {
        let (tx, rx) = oneshot::channel();

        let spawned = thread::Builder::new()
            .name("xreq-send".to_string())
            .spawn(move || {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| self.send())).map_err(panic_message);
                // Receiver gone means nobody wants the result
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn send worker");
        }

        PendingResponse { receiver: rx }
    }

    /// Send every request concurrently, returning responses in input order
    pub async fn send_all(requests: impl IntoIterator<Item = Request>) -> Vec<Result<Response>> {
        futures::future::join_all(requests.into_iter().map(Request::send_async)).await
    }
}

/// Handle to a request running on a worker thread
#[derive(Debug)]
#[must_use = "a pending response does nothing unless awaited or waited on"]
pub struct PendingResponse {
    receiver: oneshot::Receiver<std::result::Result<Response, String>>,
}

impl PendingResponse {
    /// Block the current thread until the response is ready
    ///
    /// Panics when called from within an async execution context.
    pub fn wait(self) -> Result<Response> {
        finish(self.receiver.blocking_recv())
    }
}

impl Future for PendingResponse {
    type Output = Result<Response>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(finish)
    }
}

fn finish(
    received: std::result::Result<std::result::Result<Response, String>, oneshot::error::RecvError>,
) -> Result<Response> {
    match received {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(message)) => Err(Error::task(message)),
        Err(_) => Err(Error::task("send worker exited without a response")),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "send worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};

    fn mock() -> Arc<MockTransport> {
        Arc::new(MockTransport::respond(200, "ok").header("Content-Type", "text/plain"))
    }

    #[test]
    fn test_defaults() {
        let req = Request::new("http://example.test/");
        assert_eq!(req.url(), "http://example.test/");
        assert_eq!(req.timeout_ms(), 3000);
        assert!(req.verify_ssl());

        let prepared = req.prepare();
        assert_eq!(prepared.method, Method::GET);
        assert!(prepared.headers.is_empty());
        assert!(prepared.payload.is_empty());
        assert!(prepared.tls.is_strict());
        assert_eq!(prepared.cookie_file, None);
    }

    #[test]
    fn test_header_last_wins() {
        let prepared = Request::new("http://example.test/")
            .header("X-Trace", "first")
            .header("Accept", "*/*")
            .header("X-Trace", "second")
            .prepare();

        assert_eq!(
            prepared.header_lines(),
            vec!["Accept: */*".to_string(), "X-Trace: second".to_string()]
        );
    }

    #[test]
    fn test_query_parameters() {
        let req = Request::new("http://example.test/search")
            .param("q", "hello world")
            .param("lang", "en")
            .param("q", "a&b");

        assert_eq!(
            req.effective_url(),
            "http://example.test/search?lang=en&q=a%26b"
        );
        assert_eq!(req.url(), "http://example.test/search");
    }

    #[test]
    fn test_no_parameters_leaves_url() {
        let req = Request::new("http://example.test/path?x=1");
        assert_eq!(req.prepare().url, "http://example.test/path?x=1");
    }

    #[test]
    fn test_repeated_send_uses_same_url() {
        let transport = mock();
        let req = Request::with("http://example.test/", transport.clone()).param("id", "7");

        req.send();
        req.send();

        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://example.test/?id=7"; 2]);
    }

    #[test]
    fn test_body_overrides_content_type() {
        let transport = mock();
        Request::with("http://example.test/", transport.clone())
            .header("Content-Type", "text/plain")
            .body(r#"{"a":1}"#, "application/json")
            .send();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        assert!(sent
            .header_lines()
            .contains(&"Content-Type: application/json".to_string()));
        match sent.payload {
            Payload::Raw(bytes) => assert_eq!(&bytes[..], br#"{"a":1}"#),
            other => panic!("expected raw payload, got {:?}", other),
        }
    }

    #[test]
    fn test_form_post_accepts_borrowed_data() {
        let data = String::from("a=1&b=2");
        let prepared = Request::form_post("http://example.test/", data.as_str()).prepare();

        assert_eq!(prepared.method, Method::POST);
        assert_eq!(prepared.header("Content-Type"), Some(FORM_URLENCODED));
        match prepared.payload {
            Payload::Raw(bytes) => assert_eq!(&bytes[..], b"a=1&b=2"),
            other => panic!("expected raw payload, got {:?}", other),
        }

        let from_bytes =
            Request::form_post("http://example.test/", &data.as_bytes()[..3]).prepare();
        match from_bytes.payload {
            Payload::Raw(bytes) => assert_eq!(&bytes[..], b"a=1"),
            other => panic!("expected raw payload, got {:?}", other),
        }
    }

    #[test]
    fn test_lowercase_header_names_are_found_by_lookup() {
        let transport = Arc::new(
            MockTransport::respond(200, "ok").header("content-type", "text/html"),
        );
        let resp = Request::with("http://example.test/", transport).send();

        assert!(resp.headers.contains_key("content-type"));
        assert!(!resp.headers.contains_key("Content-Type"));
        assert_eq!(resp.header("Content-Type"), Some("text/html"));
        assert_eq!(resp.content_type(), Some("text/html"));
    }

    #[test]
    fn test_empty_body_is_not_attached() {
        let prepared = Request::new("http://example.test/")
            .body("", "text/plain")
            .prepare();

        assert_eq!(prepared.method, Method::GET);
        assert!(prepared.payload.is_empty());
        assert_eq!(prepared.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_multipart_wins_over_body() {
        let prepared = Request::new("http://example.test/upload")
            .body("raw", "text/plain")
            .file("doc", "/tmp/report.pdf")
            .file("doc2", "/tmp/notes.txt")
            .prepare();

        assert_eq!(prepared.method, Method::POST);
        assert_eq!(prepared.header("Content-Type"), None);
        match prepared.payload {
            Payload::Multipart(form) => {
                assert_eq!(form.len(), 2);
                assert_eq!(form.parts()[0].field(), "doc");
            }
            other => panic!("expected multipart payload, got {:?}", other),
        }
    }

    #[test]
    fn test_insecure_toggles_both_checks() {
        let off = Request::new("https://example.test/").insecure(true).prepare();
        assert_eq!(off.tls, TlsVerification::disabled());

        let back_on = Request::new("https://example.test/")
            .insecure(true)
            .insecure(false)
            .prepare();
        assert_eq!(back_on.tls, TlsVerification::strict());
    }

    #[test]
    fn test_timeout_and_cookie_file_pass_through() {
        let prepared = Request::new("http://example.test/")
            .timeout(-1)
            .cookie_file("/tmp/jar.txt")
            .prepare();

        assert_eq!(prepared.timeout_ms, -1);
        assert_eq!(prepared.timeout(), None);
        assert_eq!(prepared.cookie_file, Some(PathBuf::from("/tmp/jar.txt")));
    }

    #[test]
    fn test_auth_headers() {
        let basic = Request::new("http://example.test/")
            .basic_auth("user", "pass")
            .prepare();
        assert_eq!(basic.header("Authorization"), Some("Basic dXNlcjpwYXNz"));

        let bearer = Request::new("http://example.test/")
            .basic_auth("user", "pass")
            .bearer_auth("tok")
            .prepare();
        assert_eq!(bearer.header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn test_send_collects_response() {
        let transport = Arc::new(
            MockTransport::respond(201, "created")
                .header("Location", "/items/1")
                .chunk_size(2),
        );
        let resp = Request::with("http://example.test/items", transport).send();

        assert_eq!(resp.status_code, 201);
        assert_eq!(resp.text().unwrap(), "created");
        assert_eq!(resp.headers["Location"], "/items/1");
    }

    #[test]
    fn test_transport_failure_is_reported_in_body() {
        let transport = Arc::new(MockTransport::failing(TransportError::CouldntConnect));
        let resp = Request::with("http://example.test/", transport.clone()).send();

        assert_eq!(resp.status_code, 0);
        assert_eq!(resp.text().unwrap(), "Couldn't connect to server");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_send_async_resolves() {
        let transport = mock();
        let pending = Request::with("http://example.test/", transport.clone()).send_async();

        let resp = tokio_test::block_on(pending).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.text().unwrap(), "ok");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_send_async_wait() {
        let resp = Request::with("http://example.test/", mock())
            .send_async()
            .wait()
            .unwrap();
        assert_eq!(resp.status_code, 200);
    }

    #[test]
    fn test_send_async_propagates_panic() {
        let transport = Arc::new(MockTransport::panicking("transport exploded"));
        let err = Request::with("http://example.test/", transport)
            .send_async()
            .wait()
            .unwrap_err();

        assert!(err.is_task());
        assert!(err.to_string().contains("transport exploded"));
    }

    #[tokio::test]
    async fn test_send_all_keeps_order() {
        let ok = mock();
        let failing = Arc::new(MockTransport::failing(TransportError::TimedOut));

        let results = Request::send_all(vec![
            Request::with("http://example.test/a", ok.clone()),
            Request::with("http://example.test/b", failing),
            Request::with("http://example.test/c", ok.clone()),
        ])
        .await;

        let statuses: Vec<u16> = results
            .into_iter()
            .map(|r| r.unwrap().status_code)
            .collect();
        assert_eq!(statuses, vec![200, 0, 200]);
        assert_eq!(ok.calls(), 2);
    }
}
