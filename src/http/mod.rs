//! Request and response envelopes threaded through the state chain.
//!
//! These are deliberately thin wrappers over the `http` crate's types: the
//! transport layer owns parsing and socket I/O, the chain only reads and
//! rewrites the fields its policy steps care about.

pub mod request;
pub mod response;

pub use request::{Request, RequestLine};
pub use response::{Body, Cookie, CookieJar, Raise, Response};
