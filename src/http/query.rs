// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Query string assembly

use std::collections::BTreeMap;

/// Percent-encode a query value
///
/// Everything except `A-Z a-z 0-9 - . _ ~` is escaped byte by byte as `%XX`,
/// so a space becomes `%20`.
pub fn encode_value(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char)
            }
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}

/// Join parameters as `name=encoded_value` pairs separated by `&`
///
/// Names are emitted literally.
pub fn build_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", name, encode_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append encoded parameters to `url`
///
/// An empty map leaves the URL untouched. The query is introduced with `?`,
/// or with `&` when the URL already carries one.
pub fn append_query(url: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let separator = match url.find('?') {
        None => "?",
        Some(_) if url.ends_with('?') || url.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}{}", url, separator, build_query(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value("plain-text_1.0~"), "plain-text_1.0~");
        assert_eq!(encode_value("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_value("ä"), "%C3%A4");
    }

    #[test]
    fn test_names_are_literal() {
        let query = build_query(&params(&[("a b", "c d")]));
        assert_eq!(query, "a b=c%20d");
    }

    #[test]
    fn test_append_query() {
        let url = append_query(
            "http://example.test/search",
            &params(&[("q", "rust lang"), ("page", "2")]),
        );
        assert_eq!(url, "http://example.test/search?page=2&q=rust%20lang");
    }

    #[test]
    fn test_empty_params_leave_url() {
        assert_eq!(
            append_query("http://example.test/", &BTreeMap::new()),
            "http://example.test/"
        );
    }

    #[test]
    fn test_existing_query() {
        let p = params(&[("b", "2")]);
        assert_eq!(append_query("http://x.test/?a=1", &p), "http://x.test/?a=1&b=2");
        assert_eq!(append_query("http://x.test/?", &p), "http://x.test/?b=2");
    }
}
