//! Process-wide constants shared with application code through the chain's
//! `constants` slot.

use http::Method;

/// Table of fixed values the pipeline and application handlers agree on.
#[derive(Debug)]
pub struct Constants {
    /// HTTP methods that are safe to replay (no server-side effects).
    pub safe_methods: &'static [&'static str],
    /// Liveness endpoint reachable even when the edge proxy is bypassed.
    pub health_check_path: &'static str,
    /// Path prefix exempt from canonical host/scheme redirection.
    pub callbacks_prefix: &'static str,
    /// Cache-Control value attached to canonicalization redirects.
    pub redirect_cache_control: &'static str,
}

/// The one table handed out to every request.
pub static CONSTANTS: Constants = Constants {
    safe_methods: &["GET", "HEAD", "OPTIONS", "TRACE"],
    health_check_path: "/callbacks/health",
    callbacks_prefix: "/callbacks/",
    redirect_cache_control: "public, max-age=86400",
};

/// Whether `method` is in the safe-method set.
pub fn is_safe_method(method: &Method) -> bool {
    CONSTANTS.safe_methods.contains(&method.as_str())
}
