// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie jar with Netscape cookie file persistence
//!
//! The file format is the one curl and wget read and write: one cookie per
//! line, seven tab-separated fields
//! (`domain`, `include_subdomains`, `path`, `secure`, `expires`, `name`,
//! `value`). HttpOnly cookies carry a `#HttpOnly_` prefix on the domain;
//! every other line starting with `#` is a comment.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use tracing::debug;
use url::Url;

use crate::error::{ErrorContext, Result};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";
const FILE_HEADER: &str = "# Netscape HTTP Cookie File\n\
                           # This file was generated by xreq. Edit at your own risk.\n\n";

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to, without a leading dot
    pub domain: String,
    /// Also sent to subdomains of `domain`
    pub include_subdomains: bool,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            include_subdomains: false,
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the domain, matching subdomains as well
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into().trim_start_matches('.').to_string();
        self.include_subdomains = true;
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set http_only flag
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Check if the cookie matches the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !self.domain_matches(host) {
            return false;
        }

        if !self.path_matches(url.path()) {
            return false;
        }

        if self.secure && url.scheme() != "https" {
            return false;
        }

        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        if self.include_subdomains {
            host == self.domain || host.ends_with(&format!(".{}", self.domain))
        } else {
            host == self.domain
        }
    }

    /// A cookie path covers itself and everything below it at a `/` boundary,
    /// so `/foo` matches `/foo/bar` but not `/foobar`
    fn path_matches(&self, request_path: &str) -> bool {
        if request_path == self.path {
            return true;
        }
        request_path.starts_with(&self.path)
            && (self.path.ends_with('/') || request_path[self.path.len()..].starts_with('/'))
    }

    /// Parse a Set-Cookie header value
    ///
    /// Returns `None` when the header is malformed or names a `Domain` the
    /// request host does not belong to. Without a `Path` attribute the cookie
    /// is scoped to the directory of the request path.
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim());

        // Host-only unless a Domain attribute widens it
        let host = url.host_str().unwrap_or("").to_lowercase();
        cookie.domain = host.clone();
        cookie.path = default_path(url.path()).to_string();

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let val = val.trim();
                match attr.trim().to_lowercase().as_str() {
                    "domain" if !val.is_empty() => {
                        let domain = val.trim_start_matches('.').to_lowercase();
                        if host != domain && !host.ends_with(&format!(".{}", domain)) {
                            debug!(
                                host = %host,
                                domain = %domain,
                                "rejecting cookie for foreign domain"
                            );
                            return None;
                        }
                        cookie.domain = domain;
                        cookie.include_subdomains = true;
                    }
                    "path" if val.starts_with('/') => cookie.path = val.to_string(),
                    "expires" => {
                        if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                            cookie.expires = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            cookie.expires = Some(Utc::now() + chrono::Duration::seconds(secs));
                        }
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }

    /// Parse one line of a Netscape cookie file
    ///
    /// Returns `None` for comments, blank lines and malformed entries.
    pub fn from_netscape_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 6 {
            return None;
        }

        let expires = match fields[4].parse::<i64>().ok()? {
            0 => None,
            secs => Some(Utc.timestamp_opt(secs, 0).single()?),
        };

        Some(Self {
            name: fields[5].to_string(),
            value: fields.get(6).copied().unwrap_or("").to_string(),
            domain: fields[0].trim_start_matches('.').to_string(),
            include_subdomains: fields[1].eq_ignore_ascii_case("TRUE"),
            path: fields[2].to_string(),
            expires,
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            http_only,
        })
    }

    /// Format as one Netscape cookie file line
    pub fn to_netscape_line(&self) -> String {
        let flag = |b: bool| if b { "TRUE" } else { "FALSE" };
        format!(
            "{}{}{}\t{}\t{}\t{}\t{}\t{}\t{}",
            if self.http_only { HTTP_ONLY_PREFIX } else { "" },
            if self.include_subdomains { "." } else { "" },
            self.domain,
            flag(self.include_subdomains),
            self.path,
            flag(self.secure),
            self.expires.map_or(0, |e| e.timestamp()),
            self.name,
            self.value
        )
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Directory of a request path, the scope of a cookie set without `Path`
fn default_path(request_path: &str) -> &str {
    match request_path.rfind('/') {
        Some(idx) if idx > 0 && request_path.starts_with('/') => &request_path[..idx],
        _ => "/",
    }
}

/// Thread-safe cookie storage
#[derive(Debug, Clone)]
pub struct CookieJar {
    /// Cookies stored by domain
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
        }
    }

    /// Load a jar from a Netscape cookie file
    ///
    /// A missing file yields an empty jar.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "cookie file not found, starting empty");
            return Ok(Self::new());
        }

        let text = fs::read_to_string(path)
            .context(&format!("reading cookie file {}", path.display()))?;
        Ok(Self::from_netscape(&text))
    }

    /// Write the jar to a Netscape cookie file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_netscape())
            .context(&format!("writing cookie file {}", path.display()))
    }

    /// Build a jar from Netscape cookie file contents
    pub fn from_netscape(text: &str) -> Self {
        let jar = Self::new();
        for line in text.lines() {
            match Cookie::from_netscape_line(line) {
                Some(cookie) if !cookie.is_expired() => jar.add(cookie),
                Some(_) => {}
                None => {
                    if !line.trim().is_empty() && !line.starts_with('#') {
                        debug!(line, "skipping malformed cookie line");
                    }
                }
            }
        }
        jar
    }

    /// Render every live cookie in Netscape format
    pub fn to_netscape(&self) -> String {
        let mut cookies: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|e| e.value().clone())
            .filter(|c| !c.is_expired())
            .collect();
        cookies.sort_by(|a, b| {
            (&a.domain, &a.path, &a.name).cmp(&(&b.domain, &b.path, &b.name))
        });

        let mut out = String::from(FILE_HEADER);
        for cookie in cookies {
            out.push_str(&cookie.to_netscape_line());
            out.push('\n');
        }
        out
    }

    /// Add a cookie to the jar, replacing one with the same name and path
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        entry.push(cookie);
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            self.add(cookie);
        }
    }

    /// Get all cookies for a URL, longest path first
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        let mut result: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|c| c.matches(url))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        result.sort_by(|a, b| b.path.len().cmp(&a.path.len()).then(a.name.cmp(&b.name)));
        result
    }

    /// Get Cookie header value for a URL
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|c| c.to_header_value())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Remove a specific cookie
    pub fn remove(&self, name: &str, domain: &str, path: &str) {
        if let Some(mut cookies) = self.cookies.get_mut(domain) {
            cookies.retain(|c| c.name != name || c.path != path);
        }
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
