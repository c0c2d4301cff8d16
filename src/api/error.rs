//! Error taxonomy for the modules API and the builder built on top of it

/// Failures surfaced by the resource client, the list view and the builder
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Backend answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// Backend does not know the requested module
    #[error("Module not found: {id}")]
    NotFound { id: String },

    /// Survey document is missing or has no content
    #[error("Survey document is empty")]
    EmptyDocument,

    /// No persistence capability was supplied
    #[error("No backend configured for saving modules")]
    NoBackendConfigured,

    /// Builder was opened in view mode
    #[error("Module is opened read-only")]
    ReadOnly,

    /// Builder session was torn down
    #[error("Builder session is closed")]
    Closed,

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Transport(error) => error.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_extraction() {
        let failed = ApiError::RequestFailed { status: 500, body: "boom".to_string() };
        assert_eq!(failed.status(), Some(500));
        assert_eq!(ApiError::NotFound { id: "7".to_string() }.status(), Some(404));
        assert_eq!(ApiError::EmptyDocument.status(), None);
    }

    #[test]
    fn test_display_includes_body() {
        let failed = ApiError::RequestFailed { status: 422, body: "bad name".to_string() };
        assert_eq!(failed.to_string(), "Request failed with status 422: bad name");
        assert!(ApiError::NotFound { id: "x".to_string() }.is_not_found());
    }
}
