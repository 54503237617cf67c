//! Process-wide site handle threaded read-only through the chain.
//!
//! Bundles the loaded configuration with the external collaborators nearly
//! every step needs: the rate-limit store, the error renderer and the
//! translator. Built once at startup and shared behind an `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::i18n::{Identity, Translate};
use crate::render::{DefaultRenderer, ErrorRenderer};
use crate::steps::rate_limit::{MemoryRateLimiter, RateLimitStore};

pub struct Site {
    config: SiteConfig,
    locales: HashSet<String>,
    pub db: Arc<dyn RateLimitStore>,
    pub renderer: Arc<dyn ErrorRenderer>,
    pub translator: Arc<dyn Translate>,
}

impl Site {
    /// Build a site with the default collaborators (in-memory rate limiter,
    /// plain-text renderer, pass-through translator).
    pub fn new(config: SiteConfig) -> Self {
        let limiter = MemoryRateLimiter::new(
            config.rate_limit.max_hits,
            std::time::Duration::from_secs(config.rate_limit.window_secs),
        );
        let locales = config.locales.iter().cloned().collect();
        Self {
            config,
            locales,
            db: Arc::new(limiter),
            renderer: Arc::new(DefaultRenderer),
            translator: Arc::new(Identity),
        }
    }

    pub fn with_rate_limiter(mut self, db: Arc<dyn RateLimitStore>) -> Self {
        self.db = db;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ErrorRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translate>) -> Self {
        self.translator = translator;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Canonical host, empty when host enforcement is disabled.
    pub fn canonical_host(&self) -> &str {
        &self.config.canonical_host
    }

    pub fn canonical_scheme(&self) -> &str {
        &self.config.canonical_scheme
    }

    /// Whether a subdomain label is a recognized locale code.
    pub fn is_locale(&self, subdomain: &str) -> bool {
        self.locales.contains(subdomain)
    }

    pub fn show_tracebacks(&self) -> bool {
        self.config.show_tracebacks
    }

    /// Translate a user-facing string.
    pub fn gettext(&self, msg: &str) -> String {
        self.translator.gettext(msg)
    }
}
