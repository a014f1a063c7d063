//! Domain types for Revisor.
//! Value types built from server JSON plus the errors shared across layers.

pub mod comment;
pub mod diff;
pub mod error;
pub mod identity;
pub mod review;

pub use comment::*;
pub use diff::*;
pub use error::*;
pub use identity::*;
pub use review::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_kind_display() {
        assert_eq!(LineKind::Added.to_string(), "added");
        assert_eq!(LineKind::Unchanged.to_string(), "unchanged");
    }

    #[test]
    fn test_model_error_downgrades_to_server_error() {
        let err: ApiError = ModelError::MalformedDiff("bad".into()).into();
        assert_eq!(err, ApiError::Server);
    }

    #[test]
    fn test_session_error_wraps_api_error() {
        let err: SessionError = ApiError::Rejected("Wrong password".into()).into();
        assert_eq!(err.to_string(), "Wrong password");
    }
}
