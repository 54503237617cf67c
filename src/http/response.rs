//! The outbound response accumulator and the raised-response type.
//!
//! Several steps may construct a `Response` speculatively (a redirect, a
//! translated socket error); the chain executor's merge rules decide which
//! one becomes canonical. A [`Raise`] is a response used as control flow: a
//! step returns it to abort normal forward progress, and the finalization
//! tail merges it into the canonical response.

use std::collections::BTreeMap;
use std::fmt;

use http::{HeaderMap, HeaderValue, StatusCode};

use crate::render::RenderContext;

/// A single cookie's value and the attributes we emit with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub value: String,
    pub path: Option<String>,
    pub max_age: Option<u64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Serialize as a `Set-Cookie` header value for `name`.
    pub fn to_set_cookie(&self, name: &str) -> String {
        let mut out = format!("{}={}", name, self.value);
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

/// Cookies accumulated on a response, keyed by name.
///
/// Kept as an ordered map so header emission is deterministic.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: BTreeMap<String, Cookie>,
}

impl CookieJar {
    pub fn set(&mut self, name: impl Into<String>, cookie: Cookie) {
        self.cookies.insert(name.into(), cookie);
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cookie)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` into this jar; `other`'s cookies win per-name.
    pub fn merge(&mut self, other: CookieJar) {
        self.cookies.extend(other.cookies);
    }
}

/// Response body: empty until a step or the application handler writes one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(s) => s.is_empty(),
            Body::Bytes(b) => b.is_empty(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Empty => Vec::new(),
            Body::Text(s) => s.into_bytes(),
            Body::Bytes(b) => b,
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

/// The outbound exchange under construction.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub code: StatusCode,
    pub headers: HeaderMap,
    pub cookies: CookieJar,
    pub body: Body,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(code: StatusCode) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Header value as a string, if present and valid ASCII.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header from a string, ignoring values that are not legal in a
    /// header (these cannot occur for the fixed values the steps emit).
    pub fn set_header(&mut self, name: http::HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }
}

/// Deferred body rendering for raised responses that may never be sent.
pub type LazyRender = Box<dyn FnOnce(&RenderContext<'_>) -> String + Send>;

/// A response raised as control flow to short-circuit the chain.
///
/// Carries everything a normal response carries, plus provenance metadata
/// and an optional deferred body. The deferred body must be rendered before
/// the raise is merged; afterwards the descriptor is gone and `render_body`
/// is a no-op.
pub struct Raise {
    pub response: Response,
    /// Name of the step (or call site) where this was raised.
    pub whence: Option<&'static str>,
    lazy: Option<LazyRender>,
}

impl Raise {
    pub fn from_response(response: Response) -> Self {
        Self {
            response,
            whence: None,
            lazy: None,
        }
    }

    /// A plain error response with a text body.
    pub fn error(code: StatusCode, msg: impl Into<String>) -> Self {
        let mut response = Response::with_code(code);
        response.body = Body::Text(msg.into());
        Self::from_response(response)
    }

    /// A 302 redirect to `url`.
    pub fn redirect(url: &str) -> Self {
        let mut response = Response::with_code(StatusCode::FOUND);
        response.set_header(http::header::LOCATION, url);
        Self::from_response(response)
    }

    /// An error response whose body is rendered only if it is actually sent.
    pub fn lazy(code: StatusCode, render: LazyRender) -> Self {
        let mut raise = Self::from_response(Response::with_code(code));
        raise.lazy = Some(render);
        raise
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy.is_some()
    }

    /// Record where this raise happened, keeping the earliest call site.
    pub fn set_whence(&mut self, step: &'static str) {
        self.whence.get_or_insert(step);
    }

    /// Materialize the deferred body, at most once.
    pub fn render_body(&mut self, ctx: &RenderContext<'_>) {
        if let Some(render) = self.lazy.take() {
            self.response.body = Body::Text(render(ctx));
        }
    }
}

impl fmt::Debug for Raise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raise")
            .field("code", &self.response.code)
            .field("whence", &self.whence)
            .field("lazy", &self.lazy.is_some())
            .finish()
    }
}
