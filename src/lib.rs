// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # xreq - Fluent HTTP Requests
//!
//! A thin builder over an HTTP transport: configure a request with chained
//! calls, then send it on the current thread or on a worker thread.
//!
//! ## Features
//!
//! - Chained configuration: headers, query parameters, timeout, TLS checks
//! - Raw bodies and multipart file uploads
//! - Cookie persistence through a Netscape cookie file
//! - Blocking `send` and threaded `send_async`
//! - Pluggable transports (reqwest by default, scripted mock for tests)
//!
//! ## Example
//!
//! ```rust,no_run
//! use xreq::Request;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let response = Request::new("https://example.com/upload")
//!         .header("X-Client", "xreq")
//!         .file("report", "report.pdf")
//!         .cookie_file("cookies.txt")
//!         .send_async()
//!         .await?;
//!
//!     println!("{} {}", response.status_code, response.text_lossy());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod transport;

// Errors
pub use error::{Error, ErrorContext, Result};

// HTTP
pub use http::{Cookie, CookieJar, FilePart, MultipartForm, PendingResponse, Request, Response};
pub use http::{DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT, FORM_URLENCODED};

// Transport
pub use transport::{
    MockOutcome, MockTransport, Payload, PreparedRequest, ReceiveSink, ReqwestTransport,
    TlsVerification, Transport, TransportConfig, TransportError,
};

/// xreq version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
