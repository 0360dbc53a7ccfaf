use adreel_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Refused by local validation; nothing was sent.
    #[error("Edit rejected: {0}")]
    ValidationRejected(CoreError),

    #[error("Session expired")]
    AuthExpired,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Closed locally with [`close`]; nothing was sent.
    ///
    /// [`close`]: crate::SessionSync::close
    #[error("Session closed")]
    SessionClosed,
}

impl From<CoreError> for SyncError {
    fn from(err: CoreError) -> Self {
        SyncError::ValidationRejected(err)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::NetworkFailure(err.to_string())
    }
}

impl SyncError {
    /// Map a non-success HTTP status into the session error taxonomy.
    /// `body` is the raw response body; a JSON `error` or `message` field is
    /// preferred over the raw text when present.
    pub fn from_status(status: u16, body: impl AsRef<str>) -> Self {
        let detail = error_detail(body.as_ref());
        match status {
            400 | 422 => SyncError::InvalidRequest(detail),
            401 => SyncError::AuthExpired,
            403 => SyncError::PermissionDenied(detail),
            404 => SyncError::NotFound(detail),
            _ => SyncError::NetworkFailure(format!("HTTP {status}: {detail}")),
        }
    }

    /// Text suitable for showing to the person editing.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::ValidationRejected(err) => err.to_string(),
            SyncError::AuthExpired => "Your session has expired. Please sign in again.".into(),
            SyncError::PermissionDenied(_) => {
                "You do not have permission to edit this video.".into()
            }
            SyncError::NotFound(_) => {
                "This clip or editing session no longer exists. Reload and try again.".into()
            }
            SyncError::InvalidRequest(detail) => format!("The edit could not be applied: {detail}"),
            SyncError::NetworkFailure(_) => {
                "Could not reach the editing service. Check your connection and try again.".into()
            }
            SyncError::SessionClosed => "This editing session has been closed.".into(),
        }
    }

    /// A success response whose body could not be used. Reported with the
    /// rejected requests since retrying it unchanged would fail the same way.
    pub fn malformed_response(detail: impl std::fmt::Display) -> Self {
        SyncError::InvalidRequest(format!("malformed response: {detail}"))
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, SyncError::AuthExpired)
    }
}

fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["error", "message", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.to_string()
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(SyncError::from_status(400, ""), SyncError::InvalidRequest(_)));
        assert!(matches!(SyncError::from_status(422, ""), SyncError::InvalidRequest(_)));
        assert!(matches!(SyncError::from_status(401, ""), SyncError::AuthExpired));
        assert!(matches!(SyncError::from_status(403, ""), SyncError::PermissionDenied(_)));
        assert!(matches!(SyncError::from_status(404, ""), SyncError::NotFound(_)));
        assert!(matches!(SyncError::from_status(500, ""), SyncError::NetworkFailure(_)));
        assert!(matches!(SyncError::from_status(502, ""), SyncError::NetworkFailure(_)));
    }

    #[test]
    fn detail_prefers_json_error_field() {
        let err = SyncError::from_status(400, r#"{"error":"clips are not adjacent"}"#);
        match err {
            SyncError::InvalidRequest(detail) => assert_eq!(detail, "clips are not adjacent"),
            other => panic!("unexpected {other:?}"),
        }

        let err = SyncError::from_status(404, "session gone\n");
        match err {
            SyncError::NotFound(detail) => assert_eq!(detail, "session gone"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn only_auth_expired_requires_reauth() {
        assert!(SyncError::AuthExpired.requires_reauth());
        assert!(!SyncError::PermissionDenied("x".into()).requires_reauth());
        assert!(!SyncError::NetworkFailure("x".into()).requires_reauth());
        assert!(!SyncError::from(CoreError::NothingToUndo).requires_reauth());
    }

    #[test]
    fn core_errors_become_validation_rejections() {
        let err: SyncError = CoreError::InvalidMerge("gap".into()).into();
        assert!(matches!(err, SyncError::ValidationRejected(_)));
        assert_eq!(err.user_message(), "Invalid merge: gap");
    }
}
