use reqwest::StatusCode;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("External API error ({status}): {message}")]
    ExternalApi { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a non-success HTTP status and its body to an error
    ///
    /// The API reports failures as `{"message": ...}` or `{"error": ...}`; when
    /// neither is present the raw body is used.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no body").to_string()
            } else {
                body.trim().to_string()
            }
        });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::InvalidInput(message)
            }
            _ => AppError::ExternalApi {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// True for errors that mean the session is missing or expired
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_uses_message_field() {
        let err = AppError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"message": "User not authenticated"}"#,
        );
        assert!(err.is_auth_failure());
        assert_eq!(err.to_string(), "Unauthorized: User not authenticated");
    }

    #[test]
    fn test_error_field_is_used_when_message_missing() {
        let err = AppError::from_status(
            StatusCode::BAD_GATEWAY,
            r#"{"error": "Unable to fetch data from TMDb"}"#,
        );
        match err {
            AppError::ExternalApi { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Unable to fetch data from TMDb");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_with_plain_body() {
        let err = AppError::from_status(StatusCode::NOT_FOUND, "nope");
        assert!(matches!(err, AppError::NotFound(ref m) if m == "nope"));
    }

    #[test]
    fn test_empty_body_falls_back_to_reason() {
        let err = AppError::from_status(StatusCode::BAD_REQUEST, "");
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "Bad Request"));
    }
}
