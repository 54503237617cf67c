//! The inbound request envelope.
//!
//! Owned by exactly one in-flight request; never shared across requests.
//! Early chain steps attach derived fields (`country`, `hostname`) and the
//! canonicalization step may rewrite the request line in place.

use std::net::IpAddr;

use http::{HeaderMap, Method, Uri, Version};
use percent_encoding::percent_decode_str;

/// The declared request line: method, target URI and protocol version.
///
/// Mutable so that canonicalization can strip trailing slashes from
/// callback paths without a redirect round-trip.
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
}

/// One inbound HTTP exchange as seen by the chain.
#[derive(Debug)]
pub struct Request {
    pub line: RequestLine,
    pub headers: HeaderMap,
    /// Client address as reported by the transport layer.
    pub source: IpAddr,
    /// Set by the transport layer when the request did not come through the
    /// required edge proxy.
    pub bypasses_proxy: bool,
    /// Country code derived from the geo header, attached early in the chain.
    pub country: Option<String>,
    /// IDN-decoded Host header, attached by canonicalization.
    pub hostname: Option<String>,
}

impl Request {
    pub fn new(
        method: Method,
        uri: Uri,
        version: Version,
        headers: HeaderMap,
        source: IpAddr,
    ) -> Self {
        Self {
            line: RequestLine {
                method,
                uri,
                version,
            },
            headers,
            source,
            bypasses_proxy: false,
            country: None,
            hostname: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.line.method
    }

    /// Raw (still percent-encoded) request path.
    pub fn path_raw(&self) -> &str {
        self.line.uri.path()
    }

    /// Percent-decoded request path. Invalid UTF-8 sequences are replaced.
    pub fn path_decoded(&self) -> String {
        percent_decode_str(self.path_raw())
            .decode_utf8_lossy()
            .into_owned()
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.line.uri.query()
    }

    /// First value of a query parameter, form-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Header value as a string, if present and valid ASCII.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
