use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failures of a validation request. Each one ends only the request it belongs to.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Error parsing request body: {0}")]
    RequestMalformed(#[from] serde_json::Error),

    #[error("Payload is required")]
    PayloadRequired,

    #[error("Failed to write payload to file: {0}")]
    Artifact(#[source] std::io::Error),

    #[error("Failed to start validator: {0}")]
    Launch(#[source] std::io::Error),

    #[error("Validator exited with error: {0}")]
    Exit(String),

    #[error("Validator timed out after {0}s")]
    TimedOut(u64),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RequestMalformed(_) | AppError::PayloadRequired => StatusCode::BAD_REQUEST,
            AppError::Artifact(_)
            | AppError::Launch(_)
            | AppError::Exit(_)
            | AppError::TimedOut(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_client_errors() {
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            AppError::RequestMalformed(malformed).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::PayloadRequired.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_errors() {
        let not_found = || io::Error::new(io::ErrorKind::NotFound, "missing");

        assert_eq!(
            AppError::Artifact(not_found()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Launch(not_found()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Exit("exit status: 1".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::TimedOut(5).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_embed_underlying_error() {
        let err = AppError::Launch(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert_eq!(err.to_string(), "Failed to start validator: no such file");

        let err = AppError::Exit("exit status: 2".to_string());
        assert_eq!(err.to_string(), "Validator exited with error: exit status: 2");

        assert_eq!(
            AppError::TimedOut(30).to_string(),
            "Validator timed out after 30s"
        );
    }
}
