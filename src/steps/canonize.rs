//! Canonical host and scheme enforcement.
//!
//! Ensures every request is served on the configured root URL even when
//! several domains point at the application. Locale subdomains of the
//! canonical host are folded into `Accept-Language` instead of being
//! redirected; callback paths are exempt from enforcement but still get
//! trailing slashes stripped in place.

use http::header::{ACCEPT_LANGUAGE, CACHE_CONTROL, HOST};
use http::{HeaderValue, Uri};
use percent_encoding::percent_decode_str;

use crate::chain::{SlotId, Step, StepFlow};
use crate::constants::{is_safe_method, CONSTANTS};
use crate::http::request::Request;
use crate::http::response::Raise;

/// Decode a Host header value as an internationalized domain name.
///
/// Decoding failure yields an empty hostname rather than aborting; the
/// host comparison below then treats the request as having a bad host.
fn decode_host(raw: &str) -> String {
    let (unicode, result) = idna::domain_to_unicode(raw);
    match result {
        Ok(()) => unicode,
        Err(_) => String::new(),
    }
}

/// Strip the trailing slash from the request target, rebuilding the URI
/// from its parts.
fn strip_trailing_slash(uri: &Uri) -> Option<Uri> {
    let path = uri.path();
    debug_assert!(path.ends_with('/'));
    let trimmed = &path[..path.len() - 1];
    let query = uri.query().map(|q| format!("?{q}")).unwrap_or_default();
    let target = match (uri.scheme_str(), uri.authority()) {
        (Some(scheme), Some(authority)) => format!("{scheme}://{authority}{trimmed}{query}"),
        _ => format!("{trimmed}{query}"),
    };
    target.parse().ok()
}

/// Build the redirect target for a bad host or scheme.
fn redirect_url(request: &Request, scheme: &str, host: &str) -> String {
    let mut url = format!("{scheme}://{host}");
    if is_safe_method(request.method()) {
        // Idempotent methods keep their path and query.
        url.push_str(&request.path_decoded());
        if let Some(query) = request.query() {
            url.push('?');
            url.push_str(&percent_decode_str(query).decode_utf8_lossy());
        }
    } else {
        // Never replay a mutating request blindly; send it to the root.
        url.push('/');
    }
    url
}

pub fn canonize() -> Step {
    Step::new("canonize", &[SlotId::Request], |bag, site| {
        let Some(request) = bag.request.as_mut() else {
            return StepFlow::Continue;
        };

        let host = request.header_str(HOST.as_str()).map(decode_host).unwrap_or_default();
        request.hostname = Some(host.clone());

        if request.path_raw().starts_with(CONSTANTS.callbacks_prefix) {
            // Don't redirect callbacks, but normalize trailing slashes.
            if request.path_raw().ends_with('/') {
                match strip_trailing_slash(&request.line.uri) {
                    Some(uri) => request.line.uri = uri,
                    None => tracing::warn!(
                        uri = %request.line.uri,
                        "could not rebuild callback target without trailing slash"
                    ),
                }
            }
            return StepFlow::Continue;
        }

        let canonical_host = site.canonical_host();
        let canonical_scheme = site.canonical_scheme();
        let scheme = request
            .header_str("x-forwarded-proto")
            .unwrap_or("http");
        let bad_scheme = !canonical_scheme.is_empty() && scheme != canonical_scheme;
        let mut bad_host = false;
        if !canonical_host.is_empty() && host != canonical_host {
            match host.strip_suffix(&format!(".{canonical_host}")) {
                Some(subdomain) if site.is_locale(subdomain) => {
                    // A locale subdomain is a language hint, not a bad host.
                    let token =
                        idna::domain_to_ascii(subdomain).unwrap_or_else(|_| subdomain.to_string());
                    let existing = request.header_str(ACCEPT_LANGUAGE.as_str()).unwrap_or("");
                    let merged = format!("{token},{existing}");
                    if let Ok(value) = HeaderValue::from_str(&merged) {
                        request.headers.insert(ACCEPT_LANGUAGE, value);
                    }
                }
                _ => bad_host = true,
            }
        }

        if bad_scheme || bad_host {
            let target_host = if bad_host { canonical_host } else { host.as_str() };
            let url = redirect_url(request, canonical_scheme, target_host);
            tracing::debug!(
                bad_scheme,
                bad_host,
                target = %url,
                "redirecting to canonical URL"
            );
            let mut raise = Raise::redirect(&url);
            raise
                .response
                .set_header(CACHE_CONTROL, CONSTANTS.redirect_cache_control);
            return StepFlow::Raise(raise);
        }
        StepFlow::Continue
    })
}
