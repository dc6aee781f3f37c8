//! Session ID cookies.
//!
//! The cookie carries only the opaque session ID. Its name is derived from
//! the request host with dots replaced by underscores, so `shop.example.com`
//! uses the cookie `shop_example_com`.

use crate::traits::{decode_session_id, generate_session_id};
use std::collections::HashMap;
use std::fmt;

/// What session ID resolution needs from an inbound request and its
/// response.
pub trait SessionRequest {
    /// Host name the request was addressed to.
    fn host(&self) -> &str;

    /// Raw value of the named request cookie.
    fn cookie(&self, name: &str) -> Option<&[u8]>;

    /// The request's own unique identifier, used as the ID of a new session.
    fn request_id(&self) -> &str;

    /// Attach a cookie to the response.
    fn set_cookie(&mut self, cookie: SetCookie);
}

/// Cookie name for `host`.
pub fn cookie_name(host: &str) -> String {
    host.replace('.', "_")
}

/// Session ID for this request.
///
/// An existing session cookie is decoded byte for byte. Otherwise the
/// request ID becomes the session ID and is set as a cookie scoped to the
/// request host.
pub fn resolve_session_id<R: SessionRequest + ?Sized>(request: &mut R) -> String {
    let name = cookie_name(request.host());

    if let Some(raw) = request.cookie(&name) {
        return decode_session_id(raw);
    }

    let session_id = request.request_id().to_string();
    let cookie = SetCookie::new(name, session_id.clone()).with_domain(request.host());
    request.set_cookie(cookie);
    session_id
}

/// A `Set-Cookie` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: "/".to_string(),
            http_only: false,
            secure: false,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        write!(f, "; Path={}", self.path)?;
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

/// Split a raw `Cookie` request header into name/value pairs. Values keep
/// their bytes; surrounding double quotes are removed.
pub fn parse_cookie_header(header: &[u8]) -> HashMap<String, Vec<u8>> {
    header
        .split(|&b| b == b';')
        .filter_map(|pair| {
            let eq = pair.iter().position(|&b| b == b'=')?;
            let name = std::str::from_utf8(pair[..eq].trim_ascii()).ok()?;
            if name.is_empty() {
                return None;
            }
            let mut value = pair[eq + 1..].trim_ascii();
            if value.len() >= 2 && value.starts_with(b"\"") && value.ends_with(b"\"") {
                value = &value[1..value.len() - 1];
            }
            Some((name.to_string(), value.to_vec()))
        })
        .collect()
}

/// A [`SessionRequest`] built from plain values, for callers whose request
/// type does not implement the trait.
#[derive(Debug, Clone)]
pub struct CookieRequest {
    host: String,
    cookies: HashMap<String, Vec<u8>>,
    request_id: String,
    set_cookies: Vec<SetCookie>,
}

impl CookieRequest {
    /// A request to `host` carrying the raw `Cookie` header, if any. The
    /// request ID is freshly generated.
    pub fn new(host: impl Into<String>, cookie_header: Option<&[u8]>) -> Self {
        Self {
            host: host.into(),
            cookies: cookie_header.map(parse_cookie_header).unwrap_or_default(),
            request_id: generate_session_id(),
            set_cookies: Vec::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Cookies to send back, in the order they were set.
    pub fn set_cookies(&self) -> &[SetCookie] {
        &self.set_cookies
    }

    /// `Set-Cookie` header values for the response.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.set_cookies.iter().map(ToString::to_string).collect()
    }
}

impl SessionRequest for CookieRequest {
    fn host(&self) -> &str {
        &self.host
    }

    fn cookie(&self, name: &str) -> Option<&[u8]> {
        self.cookies.get(name).map(Vec::as_slice)
    }

    fn request_id(&self) -> &str {
        &self.request_id
    }

    fn set_cookie(&mut self, cookie: SetCookie) {
        self.set_cookies.push(cookie);
    }
}
