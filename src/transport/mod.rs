// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport layer
//!
//! A `Transport` performs one fully prepared exchange and streams what it
//! receives into a `ReceiveSink`: every raw header line first (status line,
//! each header, the terminating blank line), then every body chunk. Sinks
//! acknowledge each delivery with the number of bytes they consumed; a short
//! acknowledgement aborts the transfer with `TransportError::Write`.

mod blocking;
mod mock;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use thiserror::Error;

use crate::http::MultipartForm;

pub use blocking::{ReqwestTransport, TransportConfig};
pub use mock::{MockOutcome, MockTransport};

/// Executes prepared requests
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform the exchange, feeding received data into `sink`.
    ///
    /// Returns the numeric response status on success.
    fn perform(
        &self,
        request: &PreparedRequest,
        sink: &mut dyn ReceiveSink,
    ) -> Result<u16, TransportError>;
}

/// Receiver for streamed response data
pub trait ReceiveSink {
    /// Consume one raw header line, returning the number of bytes consumed
    fn write_header(&mut self, line: &[u8]) -> usize;

    /// Consume one body chunk, returning the number of bytes consumed
    fn write_body(&mut self, chunk: &[u8]) -> usize;
}

/// Transport-level failure
///
/// The `Display` text of each variant is the human-readable description that
/// ends up in `Response::body` when a send fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Unsupported protocol")]
    UnsupportedProtocol,

    #[error("URL using bad/illegal format or missing URL")]
    MalformedUrl,

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Couldn't resolve host name")]
    CouldntResolveHost,

    #[error("Couldn't connect to server")]
    CouldntConnect,

    #[error("Timeout was reached")]
    TimedOut,

    #[error("SSL peer certificate or SSH remote key was not OK")]
    PeerFailedVerification,

    #[error("SSL connect error")]
    SslConnect,

    #[error("Failed sending data to the peer")]
    Send,

    #[error("Failure when receiving data from the peer")]
    Recv,

    #[error("Failed writing received data to disk/application")]
    Write,

    #[error("Failed to open/read local data from file/application")]
    ReadFile,

    #[error("{0}")]
    Other(String),
}

/// TLS verification flags handed to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsVerification {
    /// Verify the peer certificate chain
    pub verify_peer: bool,
    /// Verify that the certificate matches the host name
    pub verify_host: bool,
}

impl TlsVerification {
    /// Peer and host checks enabled
    pub fn strict() -> Self {
        Self {
            verify_peer: true,
            verify_host: true,
        }
    }

    /// Peer and host checks disabled
    pub fn disabled() -> Self {
        Self {
            verify_peer: false,
            verify_host: false,
        }
    }

    /// Whether every check is enabled
    pub fn is_strict(&self) -> bool {
        self.verify_peer && self.verify_host
    }
}

impl Default for TlsVerification {
    fn default() -> Self {
        Self::strict()
    }
}

/// Request payload
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No body
    #[default]
    Empty,
    /// Literal bytes, sent without further encoding
    Raw(Bytes),
    /// Multipart form built from file parts
    Multipart(MultipartForm),
}

impl Payload {
    /// Whether a body is attached
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

/// A request with every option resolved, ready for a transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Request method, derived from the payload
    pub method: Method,
    /// Final URL including the encoded query string
    pub url: String,
    /// Headers to send, in name order
    pub headers: Vec<(String, String)>,
    /// Body
    pub payload: Payload,
    /// Timeout in milliseconds, unvalidated
    pub timeout_ms: i64,
    /// TLS verification flags
    pub tls: TlsVerification,
    /// Cookie jar path used for loading and saving
    pub cookie_file: Option<PathBuf>,
}

impl PreparedRequest {
    /// Headers in `"Name: Value"` wire form
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect()
    }

    /// Look up a header, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Timeout as a duration; zero or negative values mean no timeout
    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Deliver one header line, failing on a short acknowledgement
pub(crate) fn deliver_header(
    sink: &mut dyn ReceiveSink,
    line: &[u8],
) -> Result<(), TransportError> {
    if sink.write_header(line) != line.len() {
        return Err(TransportError::Write);
    }
    Ok(())
}

/// Deliver one body chunk, failing on a short acknowledgement
pub(crate) fn deliver_body(sink: &mut dyn ReceiveSink, chunk: &[u8]) -> Result<(), TransportError> {
    if sink.write_body(chunk) != chunk.len() {
        return Err(TransportError::Write);
    }
    Ok(())
}
