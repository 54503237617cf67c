//! Error taxonomy for the request pipeline.
//!
//! Two kinds of failure travel through the chain's `exception` slot:
//! a [`Raise`](crate::http::response::Raise) (a response used as control
//! flow, e.g. a 403 or a redirect) and an [`AppError`] (a real failure from
//! application code, e.g. a timed-out upstream call). The finalization steps
//! consume both and guarantee that neither escapes the chain boundary.

use thiserror::Error;

use crate::http::response::Raise;

/// A failure raised by application code outside the pipeline core.
#[derive(Debug, Error)]
pub enum AppError {
    /// An outbound call exceeded its deadline.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// A low-level socket or connection failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A failure wrapping another, keeping the original as the cause.
    #[error("{context}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<AppError>,
    },

    /// Anything else.
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    /// Wrap this error with additional context, keeping `self` as the cause.
    pub fn context(self, context: impl Into<String>) -> Self {
        AppError::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Unwrap one level of cause, if any.
    ///
    /// Some application modules re-raise failures with the original error
    /// attached as the cause; classification must look at the inner error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Wrapped { source, .. } => source,
            other => other,
        }
    }
}

/// What the chain's `exception` slot can hold.
#[derive(Debug)]
pub enum Exception {
    /// A response raised as control flow; merged into the canonical
    /// response by the finalization tail.
    Response(Raise),
    /// An application failure; translated to a 502/504/500 response by the
    /// finalization tail.
    App(AppError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn root_unwraps_one_level() {
        let inner = AppError::Timeout("upstream".into());
        let wrapped = inner.context("payment provider call failed");
        assert!(matches!(wrapped.root(), AppError::Timeout(_)));
    }

    #[test]
    fn root_is_identity_for_unwrapped_errors() {
        let err = AppError::Io(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(matches!(err.root(), AppError::Io(_)));
    }
}
