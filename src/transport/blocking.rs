// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport backed by reqwest's blocking client

use std::io::{self, Read};
use std::path::Path;
use std::time::Instant;

use reqwest::blocking::{multipart, Client, RequestBuilder};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use tracing::{debug, trace, warn};
use url::Url;

use super::{
    deliver_body, deliver_header, Payload, PreparedRequest, ReceiveSink, Transport,
    TransportError,
};
use crate::http::{CookieJar, DEFAULT_USER_AGENT, FORM_URLENCODED};

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string
    pub user_agent: String,
    /// Size of the buffer body chunks are read into
    pub read_buffer_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            read_buffer_size: 16 * 1024,
        }
    }
}

impl TransportConfig {
    /// Create a new transport config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set read buffer size
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }
}

/// Blocking HTTP transport
///
/// Every `perform` builds its own client, so no connection is reused across
/// sends. Redirects are never followed.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a transport with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with custom configuration
    pub fn with_config(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Get transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn client(&self, request: &PreparedRequest) -> Result<Client, TransportError> {
        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .redirect(Policy::none())
            .timeout(request.timeout());

        // rustls cannot skip the host check alone, so any relaxation drops both
        if !request.tls.is_strict() {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(|e| {
            warn!(error = %e, "failed to build HTTP client");
            TransportError::Other(format!("client initialization failed: {}", e))
        })
    }
}

impl Transport for ReqwestTransport {
    fn perform(
        &self,
        request: &PreparedRequest,
        sink: &mut dyn ReceiveSink,
    ) -> Result<u16, TransportError> {
        let url = Url::parse(&request.url).map_err(|_| TransportError::MalformedUrl)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::UnsupportedProtocol);
        }

        let jar = request.cookie_file.as_deref().map(load_jar);
        let outcome = self.exchange(request, &url, jar.as_ref(), sink);

        // The jar is written back whether or not the exchange succeeded
        if let (Some(jar), Some(path)) = (&jar, &request.cookie_file) {
            if let Err(e) = jar.save(path) {
                warn!(path = %path.display(), error = %e, "failed to write cookie file");
            }
        }

        outcome
    }
}

impl ReqwestTransport {
    fn exchange(
        &self,
        request: &PreparedRequest,
        url: &Url,
        jar: Option<&CookieJar>,
        sink: &mut dyn ReceiveSink,
    ) -> Result<u16, TransportError> {
        let client = self.client(request)?;
        let mut builder = client.request(request.method.clone(), url.clone());

        let mut user_cookies = None;
        for (name, value) in &request.headers {
            if name.eq_ignore_ascii_case(COOKIE.as_str()) {
                user_cookies = Some(value.as_str());
                continue;
            }
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            builder = builder.header(header_name, header_value);
        }

        let jar_cookies = jar.and_then(|j| j.cookie_header(url));
        if let Some(cookies) = merge_cookie_header(user_cookies, jar_cookies)? {
            builder = builder.header(COOKIE, cookies);
        }

        builder = attach_payload(builder, request)?;

        let started = Instant::now();
        let mut response = builder.send().map_err(|e| classify(&e))?;
        let status = response.status();
        trace!(
            url = %request.url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response head received"
        );

        if let Some(jar) = jar {
            for value in response.headers().get_all(SET_COOKIE) {
                if let Ok(value) = value.to_str() {
                    jar.add_from_header(value, url);
                }
            }
        }

        let status_line = format!("{:?} {}\r\n", response.version(), status);
        deliver_header(sink, status_line.as_bytes())?;
        for (name, value) in response.headers() {
            let mut line = Vec::with_capacity(name.as_str().len() + value.len() + 4);
            line.extend_from_slice(name.as_str().as_bytes());
            line.extend_from_slice(b": ");
            line.extend_from_slice(value.as_bytes());
            line.extend_from_slice(b"\r\n");
            deliver_header(sink, &line)?;
        }
        deliver_header(sink, b"\r\n")?;

        let mut buf = vec![0u8; self.config.read_buffer_size.max(1)];
        let mut received = 0usize;
        loop {
            let n = match response.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(classify_io(&e)),
            };
            deliver_body(sink, &buf[..n])?;
            received += n;
        }

        debug!(
            url = %request.url,
            status = status.as_u16(),
            bytes = received,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transfer complete"
        );
        Ok(status.as_u16())
    }
}

/// Combine a caller-set `Cookie` header with the jar's cookies into one value
fn merge_cookie_header(
    user: Option<&str>,
    jar: Option<String>,
) -> Result<Option<HeaderValue>, TransportError> {
    let merged = match (user.filter(|u| !u.trim().is_empty()), jar) {
        (Some(user), Some(jar)) => format!("{}; {}", user.trim_end_matches([';', ' ']), jar),
        (Some(user), None) => user.to_string(),
        (None, Some(jar)) => jar,
        (None, None) => return Ok(None),
    };

    HeaderValue::from_str(&merged)
        .map(Some)
        .map_err(|_| TransportError::InvalidHeader(COOKIE.as_str().to_string()))
}

fn attach_payload(
    builder: RequestBuilder,
    request: &PreparedRequest,
) -> Result<RequestBuilder, TransportError> {
    match &request.payload {
        Payload::Empty => Ok(builder),
        Payload::Raw(bytes) => {
            let builder = if request.header(CONTENT_TYPE.as_str()).is_none() {
                builder.header(CONTENT_TYPE, FORM_URLENCODED)
            } else {
                builder
            };
            Ok(builder.body(bytes.to_vec()))
        }
        Payload::Multipart(form) => {
            let mut multipart = multipart::Form::new();
            for part in form.parts() {
                multipart = multipart
                    .file(part.field().to_string(), part.path())
                    .map_err(|e| {
                        warn!(
                            field = part.field(),
                            path = %part.path().display(),
                            error = %e,
                            "cannot read multipart file"
                        );
                        TransportError::ReadFile
                    })?;
            }
            Ok(builder.multipart(multipart))
        }
    }
}

fn load_jar(path: &Path) -> CookieJar {
    CookieJar::load(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable cookie file");
        CookieJar::new()
    })
}

/// Map a reqwest failure onto the transport taxonomy
fn classify(err: &reqwest::Error) -> TransportError {
    let detail = error_chain(err);
    trace!(error = %detail, "request failed");

    if err.is_timeout() {
        TransportError::TimedOut
    } else if err.is_connect() {
        if detail.contains("dns error") || detail.contains("failed to lookup address") {
            TransportError::CouldntResolveHost
        } else if detail.contains("certificate") || detail.contains("Certificate") {
            TransportError::PeerFailedVerification
        } else if detail.contains("tls") || detail.contains("handshake") {
            TransportError::SslConnect
        } else {
            TransportError::CouldntConnect
        }
    } else if err.is_builder() {
        TransportError::MalformedUrl
    } else if err.is_body() || err.is_decode() {
        TransportError::Recv
    } else if err.is_request() {
        TransportError::Send
    } else {
        TransportError::Other(err.to_string())
    }
}

fn classify_io(err: &io::Error) -> TransportError {
    match err.kind() {
        io::ErrorKind::TimedOut => TransportError::TimedOut,
        _ => TransportError::Recv,
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
