//! Configuration management.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → wrapped into Site with runtime collaborators
//!     → shared via Arc with every in-flight request
//! ```
//!
//! Config is immutable once loaded; all fields have defaults so a minimal
//! (or missing) config file still yields a runnable site.

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::SiteConfig;
