use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("NEIS API key is not configured")]
    ApiKeyMissing,

    #[error("No school selected")]
    SchoolMissing,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Http {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }

    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }

    /// Configuration problems the user has to fix; retrying will not help.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ApiError::ApiKeyMissing | ApiError::SchoolMissing | ApiError::InvalidBaseUrl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_keeps_short_body() {
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, ApiError::Http { status: 500, ref body } if body == "boom"));
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_from_status_truncates_on_char_boundary() {
        let body = "급".repeat(400);
        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body);
        match err {
            ApiError::Http { body: truncated, .. } => {
                assert!(truncated.contains("truncated, 1200 total bytes"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_configuration_errors() {
        assert!(ApiError::ApiKeyMissing.is_configuration());
        assert!(ApiError::SchoolMissing.is_configuration());
        assert!(!ApiError::Timeout.is_configuration());
    }
}
