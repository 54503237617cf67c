//! Rejection of requests that skip the required edge proxy.

use http::StatusCode;

use crate::chain::{SlotId, Step, StepFlow};
use crate::constants::CONSTANTS;
use crate::http::response::Raise;

/// Reject requests that bypass the edge proxy, except health checks.
///
/// The transport layer sets `bypasses_proxy` when a request hit the origin
/// directly; such traffic is refused so that the proxy's protections cannot
/// be sidestepped. The liveness endpoint stays reachable for infrastructure
/// probes.
pub fn reject_requests_bypassing_proxy() -> Step {
    Step::new(
        "reject_requests_bypassing_proxy",
        &[SlotId::Request, SlotId::Response],
        |bag, _| {
            let Some(request) = bag.request.as_ref() else {
                return StepFlow::Continue;
            };
            if request.bypasses_proxy && request.path_raw() != CONSTANTS.health_check_path {
                tracing::warn!(
                    source = %request.source,
                    path = request.path_raw(),
                    "rejecting request that bypassed the proxy"
                );
                return StepFlow::Raise(Raise::error(
                    StatusCode::FORBIDDEN,
                    "The request bypassed a proxy.",
                ));
            }
            StepFlow::Continue
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StateBag;
    use crate::config::SiteConfig;
    use crate::http::request::Request;
    use crate::http::response::Response;
    use crate::site::Site;
    use http::{HeaderMap, Method, Version};

    fn bag(path: &str, bypasses_proxy: bool) -> StateBag {
        let mut request = Request::new(
            Method::GET,
            path.parse().unwrap(),
            Version::HTTP_11,
            HeaderMap::new(),
            "10.0.0.1".parse().unwrap(),
        );
        request.bypasses_proxy = bypasses_proxy;
        let mut bag = StateBag::new(request);
        bag.response = Some(Response::new());
        bag
    }

    #[test]
    fn bypassing_requests_are_rejected() {
        let mut bag = bag("/account", true);
        let site = Site::new(SiteConfig::default());
        match reject_requests_bypassing_proxy().invoke(&mut bag, &site) {
            StepFlow::Raise(raise) => {
                assert_eq!(raise.response.code, StatusCode::FORBIDDEN);
            }
            _ => panic!("expected a 403 raise"),
        }
    }

    #[test]
    fn health_check_is_exempt() {
        let mut bag = bag("/callbacks/health", true);
        let site = Site::new(SiteConfig::default());
        assert!(matches!(
            reject_requests_bypassing_proxy().invoke(&mut bag, &site),
            StepFlow::Continue
        ));
    }

    #[test]
    fn proxied_requests_pass() {
        let mut bag = bag("/account", false);
        let site = Site::new(SiteConfig::default());
        assert!(matches!(
            reject_requests_bypassing_proxy().invoke(&mut bag, &site),
            StepFlow::Continue
        ));
    }
}
