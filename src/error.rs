use reqwest::StatusCode;
use thiserror::Error;

use crate::models::ErrorCode;

/// Errors returned by NPA client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The access token is empty or whitespace only.
    #[error("access token must not be empty")]
    EmptyAccessToken,

    /// The access token contains characters that cannot be sent unchanged.
    #[error("access token contains whitespace or control characters")]
    InvalidAccessToken,

    /// Base URL is not a valid absolute URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// Endpoint name could not be joined to the base URL.
    #[error("invalid endpoint '{0}'")]
    InvalidPath(String),

    /// The requested operation is not present in the NPA catalog.
    #[error("unknown NPA operation '{0}'")]
    UnknownOperation(String),

    /// A request parameter was rejected before anything was sent.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// HTTP transport-layer request failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body could not be parsed as JSON or as the expected model.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Successful HTTP status whose body is not an NPA `OK` envelope.
    #[error("malformed NPA response: {0}")]
    MalformedResponse(String),

    /// Non-success HTTP status without an NPA error payload.
    #[error("server returned status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    /// The NPA returned an error envelope.
    #[error("NPA error #{code}: {message}")]
    Api {
        status: Option<StatusCode>,
        code: ErrorCode,
        message: String,
    },
}

impl ClientError {
    /// Returns `true` for an invalid or rejected access token.
    pub fn is_authentication(&self) -> bool {
        match self {
            Self::EmptyAccessToken | Self::InvalidAccessToken => true,
            Self::Api { code, .. } => *code == ErrorCode::InvalidKey,
            Self::HttpStatus { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }

    /// Returns `true` when the daily token quota is exhausted.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Api { code, .. } => *code == ErrorCode::LimitExceeded,
            Self::HttpStatus { status, .. } => *status == StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }

    /// Returns `true` when the request never produced an HTTP response.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Request(error) => error.is_connect() || error.is_timeout() || error.is_request(),
            _ => false,
        }
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::ClientError;
    use crate::models::ErrorCode;

    #[test]
    fn invalid_key_is_an_authentication_failure() {
        let error = ClientError::Api {
            status: None,
            code: ErrorCode::InvalidKey,
            message: "Invalid key".to_owned(),
        };
        assert!(error.is_authentication());
        assert!(!error.is_rate_limited());
        assert_eq!(error.to_string(), "NPA error #1: Invalid key");
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let error = ClientError::HttpStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        assert!(error.is_rate_limited());
        assert!(!error.is_authentication());
        assert!(!error.is_network());
    }

    #[test]
    fn malformed_response_is_not_classified() {
        let error = ClientError::MalformedResponse("empty body".to_owned());
        assert!(!error.is_authentication());
        assert!(!error.is_rate_limited());
        assert!(!error.is_network());
        assert_eq!(error.to_string(), "malformed NPA response: empty body");
    }
}
