//! Classified provider failures.
//!
//! Both providers funnel transport errors and non-2xx responses through the
//! constructors here, so the dispatcher only ever sees one taxonomy.

use reqwest::StatusCode;
use scriptrelay_core::ErrorKind;
use serde_json::Value;

/// A failed provider call, already classified.
///
/// `Display` is the client-facing message. It never contains the request
/// URL; callers still redact the credential before sending it anywhere.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Failed to connect to {provider} API: {message}")]
    Connection {
        provider: &'static str,
        message: String,
    },

    #[error("Request to {provider} API timed out.")]
    Timeout { provider: &'static str },

    #[error("{provider} API rate limit exceeded: {message}")]
    RateLimited {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} API authentication failed. Check your API key. ({message})")]
    Authentication {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} API error: {status} - {message}")]
    Status {
        provider: &'static str,
        status: u16,
        message: String,
        raw: Option<Value>,
    },

    #[error("{provider} blocked the request: {reason}")]
    Blocked {
        provider: &'static str,
        reason: String,
    },

    #[error("Failed to decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("The API key for {provider} contains characters that cannot be sent in a header.")]
    InvalidCredential { provider: &'static str },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl ProviderError {
    /// Stable tag for the failure envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Connection { .. } => ErrorKind::Connection,
            ProviderError::Timeout { .. } => ErrorKind::Timeout,
            ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
            ProviderError::Authentication { .. } | ProviderError::InvalidCredential { .. } => {
                ErrorKind::Authentication
            }
            ProviderError::Status { .. } => ErrorKind::ApiStatus,
            ProviderError::Blocked { .. } => ErrorKind::Blocked,
            ProviderError::Decode { .. } | ProviderError::Client(_) => ErrorKind::Unexpected,
        }
    }

    /// Variant name, reported alongside unexpected failures.
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderError::Connection { .. } => "Connection",
            ProviderError::Timeout { .. } => "Timeout",
            ProviderError::RateLimited { .. } => "RateLimited",
            ProviderError::Authentication { .. } => "Authentication",
            ProviderError::Status { .. } => "Status",
            ProviderError::Blocked { .. } => "Blocked",
            ProviderError::Decode { .. } => "Decode",
            ProviderError::InvalidCredential { .. } => "InvalidCredential",
            ProviderError::Client(_) => "Client",
        }
    }

    /// The provider's structured error body, when it sent one.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            ProviderError::Status { raw, .. } => raw.as_ref(),
            _ => None,
        }
    }

    /// Classify a transport-level failure (no HTTP response received).
    pub(crate) fn from_transport(provider: &'static str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            ProviderError::Timeout { provider }
        } else if err.is_decode() {
            ProviderError::Decode {
                provider,
                message: err.to_string(),
            }
        } else {
            ProviderError::Connection {
                provider,
                message: err.to_string(),
            }
        }
    }

    /// Classify a non-2xx response.
    ///
    /// `is_auth_body` lets a provider flag authentication failures it reports
    /// under a generic status (Gemini answers a bad key with `400`).
    pub(crate) fn from_status(
        provider: &'static str,
        status: StatusCode,
        body: &str,
        is_auth_body: impl Fn(&Value) -> bool,
    ) -> Self {
        let raw: Option<Value> = serde_json::from_str(body).ok();
        let message = raw
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| status_text(status));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::Authentication { provider, message }
            }
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider, message },
            _ if raw.as_ref().is_some_and(&is_auth_body) => {
                ProviderError::Authentication { provider, message }
            }
            _ => ProviderError::Status {
                provider,
                status: status.as_u16(),
                message,
                raw,
            },
        }
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// Both providers use `{"error": {"message": ...}}`; proxies in front of them
/// sometimes answer with a flat `message` or `detail`.
pub fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("message"))
        .or_else(|| body.get("detail"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &Value) -> bool {
        false
    }

    #[test]
    fn test_401_is_authentication() {
        let err = ProviderError::from_status(
            "Anthropic",
            StatusCode::UNAUTHORIZED,
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
            never,
        );
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(err.to_string().contains("invalid x-api-key"));
    }

    #[test]
    fn test_429_is_rate_limited() {
        let err = ProviderError::from_status(
            "Anthropic",
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Number of requests has exceeded your rate limit"}}"#,
            never,
        );
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_status_keeps_provider_message_and_raw_body() {
        let err = ProviderError::from_status(
            "Anthropic",
            StatusCode::BAD_REQUEST,
            r#"{"error":{"type":"invalid_request_error","message":"max_tokens: too large"}}"#,
            never,
        );
        assert_eq!(err.kind(), ErrorKind::ApiStatus);
        assert_eq!(err.to_string(), "Anthropic API error: 400 - max_tokens: too large");
        assert_eq!(err.raw().unwrap()["error"]["type"], "invalid_request_error");
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status_text() {
        let err = ProviderError::from_status(
            "Gemini",
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>oops</html>",
            never,
        );
        assert_eq!(err.to_string(), "Gemini API error: 500 - 500 Internal Server Error");
        assert!(err.raw().is_none());
    }

    #[test]
    fn test_auth_body_hook() {
        let err = ProviderError::from_status(
            "Gemini",
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"API key not valid"}}"#,
            |_| true,
        );
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_error_message_variants() {
        let nested = serde_json::json!({"error": {"message": "nested"}});
        let flat = serde_json::json!({"message": "flat"});
        let detail = serde_json::json!({"detail": "detail"});
        let blank = serde_json::json!({"error": {"message": "  "}});
        assert_eq!(error_message(&nested).as_deref(), Some("nested"));
        assert_eq!(error_message(&flat).as_deref(), Some("flat"));
        assert_eq!(error_message(&detail).as_deref(), Some("detail"));
        assert_eq!(error_message(&blank), None);
    }

    #[test]
    fn test_kinds_are_distinct() {
        let auth = ProviderError::Authentication {
            provider: "Gemini",
            message: String::new(),
        };
        let rate = ProviderError::RateLimited {
            provider: "Gemini",
            message: String::new(),
        };
        assert_ne!(auth.kind(), rate.kind());
        assert_ne!(auth.kind(), ErrorKind::MissingCredential);
        assert_eq!(
            ProviderError::InvalidCredential { provider: "Gemini" }.kind(),
            ErrorKind::Authentication
        );
        assert_eq!(ProviderError::Client("x".into()).kind(), ErrorKind::Unexpected);
    }
}
