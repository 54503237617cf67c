//! Rate limiting for unsafe methods.
//!
//! Reads are free; anything that can mutate state is counted against a
//! windowed bucket keyed by the authenticated user id, falling back to the
//! client address for anonymous traffic. The counter store is an external
//! collaborator behind [`RateLimitStore`]; [`MemoryRateLimiter`] is the
//! in-process implementation used by the demo binary and the tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use http::{Method, StatusCode};
use thiserror::Error;

use crate::chain::{SlotId, Step, StepFlow};
use crate::http::response::Raise;

/// Signalled by the store when a bucket's threshold is exceeded within its
/// window.
#[derive(Debug, Error)]
#[error("too many requests in bucket {bucket}")]
pub struct RateLimited {
    pub bucket: String,
}

/// Windowed hit counter interface.
pub trait RateLimitStore: Send + Sync {
    /// Increment the counter for `(bucket, key)` and check it against the
    /// configured threshold.
    fn hit_rate_limit(&self, bucket: &str, key: &str) -> Result<(), RateLimited>;
}

struct Window {
    count: u32,
    started: Instant,
}

/// In-memory fixed-window counter.
pub struct MemoryRateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_hits: u32,
    period: Duration,
}

impl MemoryRateLimiter {
    pub fn new(max_hits: u32, period: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_hits,
            period,
        }
    }
}

impl RateLimitStore for MemoryRateLimiter {
    fn hit_rate_limit(&self, bucket: &str, key: &str) -> Result<(), RateLimited> {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();
        let window = windows
            .entry(format!("{bucket}:{key}"))
            .or_insert_with(|| Window {
                count: 0,
                started: now,
            });
        if now.duration_since(window.started) >= self.period {
            window.count = 0;
            window.started = now;
        }
        window.count += 1;
        if window.count > self.max_hits {
            Err(RateLimited {
                bucket: bucket.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Enforce the unsafe-method rate limits.
///
/// Requires the `user` slot: on chains where no identity step ran, this
/// step is skipped entirely.
pub fn enforce_rate_limits() -> Step {
    Step::new(
        "enforce_rate_limits",
        &[SlotId::Request, SlotId::User],
        |bag, site| {
            let Some(request) = bag.request.as_ref() else {
                return StepFlow::Continue;
            };
            if request.method() == Method::GET || request.method() == Method::HEAD {
                return StepFlow::Continue;
            }
            let user_id = bag.user.as_ref().and_then(|user| user.id);
            let result = match user_id {
                Some(id) => site
                    .db
                    .hit_rate_limit("http-unsafe.user", &id.to_string()),
                None => site
                    .db
                    .hit_rate_limit("http-unsafe.ip-addr", &request.source.to_string()),
            };
            if let Err(limited) = result {
                tracing::warn!(
                    bucket = %limited.bucket,
                    source = %request.source,
                    "rate limit exceeded"
                );
                return StepFlow::Raise(Raise::lazy(
                    StatusCode::TOO_MANY_REQUESTS,
                    Box::new(|ctx| {
                        ctx.site.gettext(
                            "You are making requests too fast, please try again later.",
                        )
                    }),
                ));
            }
            StepFlow::Continue
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{StateBag, User};
    use crate::config::SiteConfig;
    use crate::http::request::Request;
    use crate::site::Site;
    use http::{HeaderMap, Version};

    fn bag(method: Method, user: Option<User>) -> StateBag {
        let request = Request::new(
            method,
            "/submit".parse().unwrap(),
            Version::HTTP_11,
            HeaderMap::new(),
            "192.0.2.7".parse().unwrap(),
        );
        let mut bag = StateBag::new(request);
        bag.user = user;
        bag
    }

    fn strict_site() -> Site {
        let mut config = SiteConfig::default();
        config.rate_limit.max_hits = 1;
        Site::new(config)
    }

    #[test]
    fn memory_store_enforces_threshold_per_window() {
        let store = MemoryRateLimiter::new(2, Duration::from_secs(60));
        assert!(store.hit_rate_limit("b", "k").is_ok());
        assert!(store.hit_rate_limit("b", "k").is_ok());
        assert!(store.hit_rate_limit("b", "k").is_err());
        // A different key has its own window.
        assert!(store.hit_rate_limit("b", "other").is_ok());
    }

    #[test]
    fn get_requests_are_not_counted() {
        let site = strict_site();
        let step = enforce_rate_limits();
        for _ in 0..5 {
            let mut bag = bag(Method::GET, Some(User::default()));
            assert!(matches!(step.invoke(&mut bag, &site), StepFlow::Continue));
        }
    }

    #[test]
    fn second_post_from_same_address_is_limited() {
        let site = strict_site();
        let step = enforce_rate_limits();
        let mut first = bag(Method::POST, Some(User::default()));
        assert!(matches!(step.invoke(&mut first, &site), StepFlow::Continue));
        let mut second = bag(Method::POST, Some(User::default()));
        match step.invoke(&mut second, &site) {
            StepFlow::Raise(raise) => {
                assert_eq!(raise.response.code, StatusCode::TOO_MANY_REQUESTS);
                assert!(raise.is_lazy());
            }
            _ => panic!("expected a 429 raise"),
        }
    }

    #[test]
    fn authenticated_users_are_keyed_by_id() {
        let site = strict_site();
        let step = enforce_rate_limits();
        let mut first = bag(Method::POST, Some(User { id: Some(42) }));
        assert!(matches!(step.invoke(&mut first, &site), StepFlow::Continue));
        // Same address, different account: separate bucket key.
        let mut other = bag(Method::POST, Some(User { id: Some(43) }));
        assert!(matches!(step.invoke(&mut other, &site), StepFlow::Continue));
        let mut again = bag(Method::POST, Some(User { id: Some(42) }));
        assert!(matches!(step.invoke(&mut again, &site), StepFlow::Raise(_)));
    }
}
