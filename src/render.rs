//! Seam to the external templating engine.
//!
//! The real error pages and refresh bodies are rendered by a templating
//! system outside this crate; the pipeline only needs the two entry points
//! below. [`DefaultRenderer`] is the plain-text fallback used by the demo
//! binary and the tests.

use http::StatusCode;

use crate::http::request::Request;
use crate::http::response::{Body, Raise, Response};
use crate::site::Site;

/// Handle to a dispatched application resource, passed through to the error
/// renderer when available.
#[derive(Debug, Clone)]
pub struct Resource {
    pub path: String,
}

/// Everything the renderer may need while materializing a body.
pub struct RenderContext<'a> {
    pub site: &'a Site,
    pub request: Option<&'a Request>,
    pub resource: Option<&'a Resource>,
}

/// External rendering engine interface.
pub trait ErrorRenderer: Send + Sync {
    /// Produce the default error page for `response`, setting its body and
    /// Content-Type.
    fn error_page(&self, ctx: &RenderContext<'_>, response: &mut Response);

    /// Build the body of a meta-refresh page pointing at `url`.
    ///
    /// May fail with a raised response, e.g. when the refresh template
    /// itself errors out.
    fn refresh_body(&self, url: &str, ctx: &RenderContext<'_>) -> Result<String, Raise>;
}

/// Minimal renderer producing plain-text error pages and a bare refresh page.
pub struct DefaultRenderer;

impl ErrorRenderer for DefaultRenderer {
    fn error_page(&self, _ctx: &RenderContext<'_>, response: &mut Response) {
        if response.code.as_u16() < 400 {
            return;
        }
        if response.body.is_empty() {
            let reason = response
                .code
                .canonical_reason()
                .unwrap_or("Internal Server Error");
            response.body = Body::Text(format!("{} {}", response.code.as_u16(), reason));
        }
        response.set_header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8");
    }

    fn refresh_body(&self, url: &str, _ctx: &RenderContext<'_>) -> Result<String, Raise> {
        if url.contains('"') || url.contains('<') {
            // A target we cannot safely embed; bail out like a template error.
            return Err(Raise::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "invalid refresh target",
            ));
        }
        Ok(format!(
            "<html><head><meta http-equiv=\"refresh\" content=\"0;url={url}\"></head>\
             <body>Redirecting to <a href=\"{url}\">{url}</a>&hellip;</body></html>"
        ))
    }
}
