//! Translation seam for user-facing strings.
//!
//! Locale catalogs are an external collaborator; the pipeline only needs a
//! function to run error messages through before they reach the client.

/// Translates user-facing strings.
pub trait Translate: Send + Sync {
    fn gettext(&self, msg: &str) -> String;
}

/// Pass-through translator used when no catalog is wired in.
pub struct Identity;

impl Translate for Identity {
    fn gettext(&self, msg: &str) -> String {
        msg.to_string()
    }
}
