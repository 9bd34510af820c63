// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request builder and response types
//!
//! Requests accumulate options through chained calls and are executed by a
//! `Transport`, which streams the response back through callbacks.

mod cookie;
mod multipart;
pub mod query;
mod request;
mod response;

pub use cookie::{Cookie, CookieJar};
pub use multipart::{FilePart, MultipartForm};
pub use request::{PendingResponse, Request};
pub use response::Response;

/// Default per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: i64 = 3000;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("xreq/", env!("CARGO_PKG_VERSION"));

/// Content type used by `Request::post`
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Common HTTP headers
pub mod headers {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE: &str = "Content-Type";
}
