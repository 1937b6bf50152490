//! Error types for the redirect core.
//!
//! # Design
//! `RedirectError` covers everything the redirect state machine itself can
//! decide is fatal. `FollowError` adds the transport's own error type on top
//! without wrapping or reformatting it, so callers can match on connection
//! failures exactly as their transport reports them.

use thiserror::Error;

use crate::chain::ChainState;

/// Failures raised by the redirect state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RedirectError {
    /// The server kept redirecting past the configured hop bound.
    #[error("too many redirects (limit {max_hops})")]
    TooManyRedirects { max_hops: usize },

    /// A redirect status arrived without a usable `Location`.
    #[error("invalid redirect target for status {status}: {}", .location.as_deref().unwrap_or("<missing>"))]
    InvalidRedirectTarget {
        status: u16,
        location: Option<String>,
    },

    /// The chain was driven out of order, e.g. a response fed to a chain
    /// that already finished.
    #[error("redirect chain is {state:?}")]
    UnexpectedState { state: ChainState },
}

/// Errors returned by `RedirectClient::follow` and `follow_redirects`.
#[derive(Debug, Error)]
pub enum FollowError<E> {
    #[error(transparent)]
    Redirect(#[from] RedirectError),

    /// Passed through from the transport unchanged.
    #[error(transparent)]
    Transport(E),
}

impl<E> FollowError<E> {
    /// True when the chain hit the hop bound.
    pub fn is_too_many_redirects(&self) -> bool {
        matches!(
            self,
            FollowError::Redirect(RedirectError::TooManyRedirects { .. })
        )
    }

    /// True when a redirect response carried no usable `Location`.
    pub fn is_invalid_target(&self) -> bool {
        matches!(
            self,
            FollowError::Redirect(RedirectError::InvalidRedirectTarget { .. })
        )
    }

    /// The transport error, if that is what ended the chain.
    pub fn transport(&self) -> Option<&E> {
        match self {
            FollowError::Transport(e) => Some(e),
            FollowError::Redirect(_) => None,
        }
    }
}

/// Errors from loading a `RedirectConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid redirect config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid header name in config: {0:?}")]
    InvalidHeaderName(String),
}

/// A method string that is not a valid HTTP token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid HTTP method: {0:?}")]
pub struct ParseMethodError(pub String);
