use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid username or password")]
    BadCredentials,

    #[error("two-factor authentication required")]
    TwoFactorRequired,

    #[error("additional verification required")]
    ChallengeRequired,

    #[error("rate limited - please wait before retrying")]
    RateLimited,

    #[error("login required - session is no longer valid")]
    AuthExpired,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("server error: {0}")]
    ServerError(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error envelope the API attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    two_factor_required: bool,
}

impl ClientError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Classify a failed response. Auth failures arrive as 400s with a
    /// reason in the body, so the payload is consulted before the status
    /// code.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
            if payload.two_factor_required {
                return ClientError::TwoFactorRequired;
            }
            let reason = payload.error_type.or(payload.message).unwrap_or_default();
            match reason.as_str() {
                "bad_password" | "invalid_user" => return ClientError::BadCredentials,
                "two_factor_required" => return ClientError::TwoFactorRequired,
                "challenge_required" => return ClientError::ChallengeRequired,
                "login_required" => return ClientError::AuthExpired,
                "rate_limit_error" => return ClientError::RateLimited,
                _ => {}
            }
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ClientError::AuthExpired,
            404 => ClientError::NotFound(truncated),
            429 => ClientError::RateLimited,
            500..=599 => ClientError::ServerError(truncated),
            _ => ClientError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}
