//! Core types for Scriptrelay: the request shapes accepted from clients and
//! the uniform envelopes returned for every call.
//!
//! Every code path in the relay ends in one of these envelopes, whichever
//! provider was used and whatever failed along the way.

use serde::{Deserialize, Serialize};

/// Script returned when a provider call succeeds but yields no text.
pub const EMPTY_SCRIPT_PLACEHOLDER: &str = "[No text content found in response]";

// ─────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────

/// A single script-generation request.
///
/// `prompt` may be empty; it is forwarded as-is.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// User prompt text.
    #[serde(default)]
    pub prompt: String,
    /// Model identifier, e.g. `"claude-3-5-sonnet-20240620"` or `"gemini-1.5-pro"`.
    pub model_identifier: String,
    /// Per-request credential; takes precedence over any configured fallback.
    #[serde(
        default,
        alias = "api_key",
        alias = "apiKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub credential: Option<String>,
    /// Per-request system instruction; empty means "use the provider default".
    #[serde(
        default,
        alias = "system_prompt",
        alias = "systemPrompt",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model_identifier: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model_identifier: model_identifier.into(),
            credential: None,
            system_instruction: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Body of a credential-validation call. The provider comes from the route.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationRequest {
    #[serde(default, alias = "api_key", alias = "apiKey")]
    pub credential: String,
}

// ─────────────────────────────────────────────
// Error kinds
// ─────────────────────────────────────────────

/// Stable tag classifying a failure envelope.
///
/// Serialized as snake_case into `data.error_type`, so callers can branch on
/// it without parsing the human-readable message.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedModel,
    MissingCredential,
    InvalidRequest,
    Connection,
    Timeout,
    RateLimited,
    Authentication,
    ApiStatus,
    Blocked,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedModel => "unsupported_model",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Connection => "connection",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Authentication => "authentication",
            ErrorKind::ApiStatus => "api_status",
            ErrorKind::Blocked => "blocked",
            ErrorKind::Unexpected => "unexpected",
        }
    }

    /// Failures decided without (or regardless of) any upstream call.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnsupportedModel
                | ErrorKind::MissingCredential
                | ErrorKind::InvalidRequest
                | ErrorKind::Blocked
        )
    }

    /// Whether an outer layer may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Connection | ErrorKind::Timeout | ErrorKind::RateLimited
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// Generation envelope
// ─────────────────────────────────────────────

/// Payload of an envelope: the script on success, diagnostics on failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_error: Option<serde_json::Value>,
}

/// The uniform `{ success, data?, error? }` response shape.
///
/// Build it only through [`ResponseEnvelope::success`] and
/// [`ResponseEnvelope::failure`]: a success always carries a script and no
/// error, a failure always carries an error and never a script.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EnvelopeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(script: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(EnvelopeData {
                script: Some(script.into()),
                ..Default::default()
            }),
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(EnvelopeData {
                error_type: Some(kind),
                ..Default::default()
            }),
            error: Some(error.into()),
        }
    }

    /// Attach the provider's structured error body (already redacted).
    pub fn with_raw_error(mut self, raw: serde_json::Value) -> Self {
        if !self.success {
            if let Some(data) = self.data.as_mut() {
                data.raw_error = Some(raw);
            }
        }
        self
    }

    pub fn script(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.script.as_deref())
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.data.as_ref().and_then(|d| d.error_type)
    }
}

// ─────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────

/// Outcome of probing a credential against its provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
    /// Why the credential was rejected; `None` when valid.
    pub kind: Option<ErrorKind>,
}

impl ValidationResult {
    pub fn valid(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
            kind: None,
        }
    }

    pub fn invalid(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            kind: Some(kind),
        }
    }
}

/// Wire shape of a validation response: `{ success, message }` or
/// `{ success: false, error, data: { error_type } }`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EnvelopeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ValidationResult> for ValidationEnvelope {
    fn from(result: ValidationResult) -> Self {
        if result.valid {
            Self {
                success: true,
                message: Some(result.message),
                data: None,
                error: None,
            }
        } else {
            Self {
                success: false,
                message: None,
                data: Some(EnvelopeData {
                    error_type: Some(result.kind.unwrap_or(ErrorKind::Unexpected)),
                    ..Default::default()
                }),
                error: Some(result.message),
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
