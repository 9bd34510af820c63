// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for xreq
//!
//! `Request::send` never fails: transport failures are reported inside the
//! returned `Response`. The `Error` type covers everything around it: the
//! threaded send path, cookie persistence and response body decoding.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for xreq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xreq
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure surfaced outside of a `Response`
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body is not valid UTF-8
    #[error("Invalid UTF-8 in response body: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cookie file could not be parsed
    #[error("Cookie error: {0}")]
    Cookie(String),

    /// The worker running a threaded send died before producing a response
    #[error("Send task failed: {0}")]
    Task(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a cookie error
    pub fn cookie<S: Into<String>>(msg: S) -> Self {
        Error::Cookie(msg.into())
    }

    /// Create a task error
    pub fn task<S: Into<String>>(msg: S) -> Self {
        Error::Task(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error came from a threaded send
    pub fn is_task(&self) -> bool {
        matches!(self, Error::Task(_))
    }

    /// Check if this is a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(TransportError::TimedOut))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Other(format!("{}: {}", msg, err))
        })
    }
}
