// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::transport::ReceiveSink;

/// HTTP response representation
///
/// Starts empty and is filled in by the transport while a send runs. A status
/// code of 0 means the exchange never completed; the body then holds the
/// transport's description of what went wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Response status code, 0 when the transfer failed
    pub status_code: u16,
    /// Response body, exactly as received
    pub body: Vec<u8>,
    /// Response headers keyed by name as received
    ///
    /// [`ReqwestTransport`](crate::ReqwestTransport) delivers lowercase
    /// names, so look values up with [`Response::header`] rather than
    /// indexing with a canonical spelling.
    pub headers: BTreeMap<String, String>,
}

impl Response {
    /// Create an empty response
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body chunk, returning the number of bytes consumed
    pub fn write_body(&mut self, chunk: &[u8]) -> usize {
        self.body.extend_from_slice(chunk);
        chunk.len()
    }

    /// Record one raw header line, returning the number of bytes consumed
    ///
    /// The status line and the terminating blank line carry no colon and are
    /// skipped. The value starts two bytes past the colon, so a single space
    /// after the separator is assumed; a line ending right at the colon
    /// yields an empty value.
    pub fn write_header(&mut self, line: &[u8]) -> usize {
        let consumed = line.len();
        let line = String::from_utf8_lossy(line);

        if let Some(colon) = line.find(':') {
            let name = &line[..colon];
            let value = line
                .get(colon + 2..)
                .unwrap_or("")
                .trim_end_matches(|c: char| c == '\r' || c == '\n');
            self.headers.insert(name.to_string(), value.to_string());
        }

        consumed
    }

    /// Whether the transport completed the exchange
    pub fn is_ok(&self) -> bool {
        self.status_code != 0
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Get a header value, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get body as text
    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8(self.body.clone())?)
    }

    /// Get body as text, lossy conversion
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

impl ReceiveSink for Response {
    fn write_header(&mut self, line: &[u8]) -> usize {
        Response::write_header(self, line)
    }

    fn write_body(&mut self, chunk: &[u8]) -> usize {
        Response::write_body(self, chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_response() {
        let resp = Response::default();
        assert_eq!(resp.status_code, 0);
        assert!(resp.body.is_empty());
        assert!(resp.headers.is_empty());
        assert!(!resp.is_ok());
    }

    #[test]
    fn test_header_line_parsing() {
        let mut resp = Response::new();
        let line = b"Content-Type: text/html";
        assert_eq!(resp.write_header(line), line.len());
        assert_eq!(resp.headers["Content-Type"], "text/html");
    }

    #[test]
    fn test_header_line_strips_crlf() {
        let mut resp = Response::new();
        resp.write_header(b"Server: nginx\r\n");
        assert_eq!(resp.headers["Server"], "nginx");
    }

    #[test]
    fn test_lines_without_colon_are_skipped() {
        let mut resp = Response::new();
        assert_eq!(resp.write_header(b"HTTP/1.1 200 OK\r\n"), 17);
        assert_eq!(resp.write_header(b"\r\n"), 2);
        assert!(resp.headers.is_empty());
    }

    #[test]
    fn test_empty_header_value() {
        let mut resp = Response::new();
        assert_eq!(resp.write_header(b"X-Empty:"), 8);
        assert_eq!(resp.headers["X-Empty"], "");
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let mut resp = Response::new();
        resp.write_header(b"Location: http://example.test:8080/\r\n");
        assert_eq!(resp.headers["Location"], "http://example.test:8080/");
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let mut resp = Response::new();
        resp.write_header(b"Set-Cookie: a=1\r\n");
        resp.write_header(b"Set-Cookie: b=2\r\n");
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.headers["Set-Cookie"], "b=2");
    }

    #[test]
    fn test_body_accumulates() {
        let mut resp = Response::new();
        assert_eq!(resp.write_body(b"Hello, "), 7);
        assert_eq!(resp.write_body(b"World!"), 6);
        assert_eq!(resp.text().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_json_body() {
        let mut resp = Response::new();
        resp.write_body(br#"{"id": 7}"#);
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut resp = Response::new();
        resp.write_body(&[0x66, 0x6f, 0xff]);
        assert!(resp.text().is_err());
        assert_eq!(resp.text_lossy(), "fo\u{fffd}");
    }
}
