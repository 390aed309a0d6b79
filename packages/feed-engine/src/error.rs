//! Feed engine error taxonomy.
//!
//! `FeedError` is what every controller operation returns. Transport failures
//! from the API client are folded into `Network` and `Server`; everything else
//! originates in the engine itself.
//!
//! Not every error is meant for the user. A `StaleResultDiscarded` is the normal
//! outcome of a superseded query, and a `MutationInFlight` is a rejected
//! double-tap. Both are logged at debug level and never turned into a notice.

use std::borrow::Cow;

use alumni_api::{ApiError, PostId};
use thiserror::Error;

use crate::capabilities::PostAction;
use crate::store::MutationKind;

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// No response from the server.
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The server answered 2xx with a body we could not read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A completion for a superseded query generation arrived and was dropped.
    #[error("stale result for generation {generation} discarded")]
    StaleResultDiscarded { generation: u64 },

    /// Malformed local input, rejected before any request was made.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{action:?} is not permitted on post {id}")]
    NotPermitted { id: PostId, action: PostAction },

    #[error("post {0} is not loaded")]
    NotFound(PostId),

    /// The same action is already pending for this post.
    #[error("{kind} already in flight for post {id}")]
    MutationInFlight { id: PostId, kind: MutationKind },

    /// The feed view was torn down.
    #[error("feed has been shut down")]
    ShutDown,
}

impl From<ApiError> for FeedError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(message) => FeedError::Network(message),
            ApiError::Server { status, message } => FeedError::Server { status, message },
            ApiError::Parse(message) => FeedError::InvalidResponse(message),
            ApiError::Config(message) => FeedError::Network(message),
        }
    }
}

impl FeedError {
    /// Whether this error should surface as a notice or error banner.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            FeedError::StaleResultDiscarded { .. }
                | FeedError::MutationInFlight { .. }
                | FeedError::ShutDown
        )
    }

    /// Whether retrying the same request can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Network(_) => true,
            FeedError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Message safe to show to the user. Server bodies are never echoed.
    pub fn safe_message(&self) -> Cow<'static, str> {
        match self {
            FeedError::Network(_) => "Could not reach the server. Check your connection.".into(),
            FeedError::Server { status: 429, .. } => {
                "Too many requests. Please try again shortly.".into()
            }
            FeedError::Server { status: 401, .. } | FeedError::Server { status: 403, .. } => {
                "You are not allowed to do that.".into()
            }
            FeedError::Server { status: 404, .. } => "That post no longer exists.".into(),
            FeedError::Server { .. } | FeedError::InvalidResponse(_) => {
                "Something went wrong. Please try again.".into()
            }
            FeedError::Validation(message) => message.clone().into(),
            FeedError::NotPermitted { .. } => "You are not allowed to do that.".into(),
            FeedError::NotFound(_) => "That post is no longer in your feed.".into(),
            FeedError::StaleResultDiscarded { .. }
            | FeedError::MutationInFlight { .. }
            | FeedError::ShutDown => "".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_map_into_taxonomy() {
        let network: FeedError = ApiError::Network("refused".into()).into();
        assert!(matches!(network, FeedError::Network(_)));
        assert!(network.is_retryable());

        let server: FeedError = ApiError::Server {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(server.is_retryable());

        let parse: FeedError = ApiError::Parse("eof".into()).into();
        assert!(matches!(parse, FeedError::InvalidResponse(_)));
        assert!(!parse.is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = FeedError::Server {
            status: 404,
            message: "gone".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.safe_message(), "That post no longer exists.");
    }

    #[test]
    fn test_stale_and_in_flight_are_silent() {
        assert!(!FeedError::StaleResultDiscarded { generation: 3 }.is_user_visible());
        assert!(!FeedError::MutationInFlight {
            id: PostId::new("1"),
            kind: MutationKind::Like,
        }
        .is_user_visible());
        assert!(FeedError::Validation("empty".into()).is_user_visible());
    }

    #[test]
    fn test_safe_message_never_echoes_server_body() {
        let err = FeedError::Server {
            status: 500,
            message: "column users.password_hash does not exist".into(),
        };
        assert!(!err.safe_message().contains("password_hash"));
    }
}
