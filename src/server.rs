//! Transport adapter: runs the state chain inside an axum server.
//!
//! The chain core is synchronous and cheap; the handler converts the axum
//! request into the chain's envelope, runs the chain, and converts the
//! canonical response back. Everything the transport layer knows that the
//! chain needs (client address, proxy evidence) is stamped onto the
//! envelope here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body as TransportBody,
    extract::{ConnectInfo, State},
    http::Request as TransportRequest,
    response::Response as TransportResponse,
    routing::any,
    Router,
};
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::chain::{Chain, SlotId, StateBag, Step, StepFlow, User};
use crate::http::request::Request;
use crate::http::response::{Body, Response};
use crate::site::Site;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<Site>,
    pub chain: Arc<Chain>,
}

/// Build the axum router: every path and method funnels into the chain.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/{*path}", any(chain_handler))
        .route("/", any(chain_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the server, accepting connections on the given listener.
pub async fn run(state: AppState, listener: TcpListener) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");
    let router = build_router(state);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

async fn chain_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: TransportRequest<TransportBody>,
) -> TransportResponse {
    let (parts, _body) = req.into_parts();
    let mut request = Request::new(
        parts.method,
        parts.uri,
        parts.version,
        parts.headers,
        addr.ip(),
    );
    // Without the edge proxy's trusted header, this request hit the origin
    // directly.
    let trusted_header = &state.site.config().proxy.trusted_header;
    request.bypasses_proxy =
        !trusted_header.is_empty() && !request.headers.contains_key(trusted_header.as_str());

    let mut bag = StateBag::new(request);
    bag.user = Some(User::default());
    let response = state.chain.run(bag, &state.site);
    into_transport(response)
}

fn into_transport(response: Response) -> TransportResponse {
    let Response {
        code,
        headers,
        cookies,
        body,
    } = response;
    let mut out = TransportResponse::new(TransportBody::from(body.into_bytes()));
    *out.status_mut() = code;
    *out.headers_mut() = headers;
    for (name, cookie) in cookies.iter() {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_set_cookie(name)) {
            out.headers_mut().append(SET_COOKIE, value);
        }
    }
    out
}

/// The demo application handler: greets and echoes the request path.
///
/// Real deployments replace this step with their dispatch logic; it only
/// exists so the pipeline can be exercised end to end.
pub fn demo_handler() -> Step {
    Step::new(
        "handle_request",
        &[SlotId::Request, SlotId::Response],
        |bag, _| {
            let Some(request) = bag.request.as_ref() else {
                return StepFlow::Continue;
            };
            let Some(response) = bag.response.as_mut() else {
                return StepFlow::Continue;
            };
            response.body = Body::Text(format!("Hello from {}\n", request.path_raw()));
            response.set_header(CONTENT_TYPE, "text/plain; charset=utf-8");
            StepFlow::Continue
        },
    )
}
