//! Request cookie access and Supabase session cookie decoding.
//!
//! The Supabase SSR helpers store the session as JSON in a cookie named
//! `sb-<project-ref>-auth-token`. Large sessions are split across
//! `<name>.0`, `<name>.1`, ... and newer clients prefix the value with
//! `base64-` followed by base64url-encoded JSON.

use std::collections::HashMap;

use axum::http::{HeaderMap, header::COOKIE};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use url::Url;

use super::types::SessionPayload;

/// Prefix marking a base64url-encoded cookie value.
const BASE64_PREFIX: &str = "base64-";

/// Upper bound on cookie chunks read for one session.
const MAX_CHUNKS: usize = 16;

/// Read-only view of the cookies sent with a request.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    values: HashMap<String, String>,
}

impl RequestCookies {
    /// Collect cookies from every `Cookie` header of a request.
    ///
    /// Malformed pairs are skipped. When a name repeats, the first value wins.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = HashMap::new();
        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    values
                        .entry(name.to_string())
                        .or_insert_with(|| value.trim().trim_matches('"').to_string());
                }
            }
        }
        Self { values }
    }

    /// Get a cookie value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether no cookies were sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for RequestCookies {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// Name of the session cookie for a Supabase project URL.
///
/// The project ref is the first DNS label of the host, so
/// `https://abcd.supabase.co` maps to `sb-abcd-auth-token`.
#[must_use]
pub fn session_cookie_name(project_url: &Url) -> Option<String> {
    let host = project_url.host_str()?;
    let project_ref = host.split('.').next().filter(|label| !label.is_empty())?;
    Some(format!("sb-{project_ref}-auth-token"))
}

/// Decode the Supabase session stored under `name`, joining chunks if needed.
///
/// Returns `None` when the cookie is absent or cannot be decoded; the caller
/// treats both as "not signed in".
#[must_use]
pub fn decode_session_cookie(cookies: &RequestCookies, name: &str) -> Option<SessionPayload> {
    let raw = read_chunked(cookies, name)?;
    let json = decode_value(&raw)?;
    SessionPayload::from_json(&json)
}

/// Read a cookie that may have been split into numbered chunks.
fn read_chunked(cookies: &RequestCookies, name: &str) -> Option<String> {
    if let Some(value) = cookies.get(name) {
        return Some(value.to_string());
    }

    let mut joined = String::new();
    for index in 0..MAX_CHUNKS {
        match cookies.get(&format!("{name}.{index}")) {
            Some(chunk) => joined.push_str(chunk),
            None => break,
        }
    }

    (!joined.is_empty()).then_some(joined)
}

/// Turn a raw cookie value into JSON text.
fn decode_value(raw: &str) -> Option<String> {
    if let Some(encoded) = raw.strip_prefix(BASE64_PREFIX) {
        let trimmed = encoded.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(trimmed)
            .or_else(|_| STANDARD.decode(encoded))
            .ok()?;
        return String::from_utf8(bytes).ok();
    }

    urlencoding::decode(raw).ok().map(std::borrow::Cow::into_owned)
}
