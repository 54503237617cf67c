//! Request-processing pipeline: an ordered state chain that turns an
//! inbound HTTP request into an outbound response.
//!
//! # Architecture Overview
//!
//! ```text
//!   transport (axum)           state chain                     transport
//!   ───────────────▶  ┌──────────────────────────┐  ──────────────────▶
//!    Request envelope │ attach context           │   Response envelope
//!                     │ create response          │
//!                     │ proxy-bypass guard       │
//!                     │ canonize host/scheme     │
//!                     │ constants + rate limits  │
//!                     │ [application handler]    │
//!                     │ content-disposition      │
//!                     ├──── finalization tail ───┤
//!                     │ merge raised response    │
//!                     │ socket errors → 502/504  │
//!                     │ CSP bypass for redirects │
//!                     │ error-page delegation    │
//!                     │ force 500 fallback       │
//!                     │ mask gateway codes       │
//!                     └──────────────────────────┘
//! ```
//!
//! Steps share a mutable [`chain::StateBag`]; any step may raise a response
//! to short-circuit straight into the finalization tail. See
//! [`steps::default_chain`] for the registration order, which is the
//! dependency contract.

// Core subsystems
pub mod chain;
pub mod config;
pub mod http;
pub mod steps;

// Request/response plumbing
pub mod constants;
pub mod error;
pub mod render;
pub mod server;
pub mod site;

// Cross-cutting concerns
pub mod i18n;

pub use chain::{Chain, StateBag, Step, StepFlow};
pub use config::SiteConfig;
pub use site::Site;
