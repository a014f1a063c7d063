//! Domain error types for Revisor.
//!
//! These errors describe what went wrong from the caller's point of view.
//! Transport-level failures are classified into [`ApiError`] before they
//! leave the infrastructure layer.

use thiserror::Error;

/// User-visible failure of a call against the review service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received at all.
    #[error("Network error")]
    Network,

    /// The server answered with a structured `client_message`.
    #[error("{0}")]
    Rejected(String),

    /// Any other non-success answer, or a body we could not make sense of.
    #[error("Internal service error")]
    Server,
}

/// Errors surfaced by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Not authenticated")]
    NotAuthenticated,

    /// A logout or a newer login overtook this operation while it was in flight.
    #[error("Session changed while the request was in flight")]
    Superseded,
}

/// Data-shaping failures when building models from server JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Malformed diff: {0}")]
    MalformedDiff(String),

    #[error("Malformed comment: {0}")]
    MalformedComment(String),

    #[error("Malformed review: {0}")]
    MalformedReview(String),
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        log::warn!("Discarding unusable server payload: {}", err);
        ApiError::Server
    }
}
