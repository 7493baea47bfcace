//! Google Generative Language API client (`gemini-` models).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use scriptrelay_core::config::ProviderConfig;

use crate::error::ProviderError;
use crate::http::{build_client, credential_header, send_json};
use crate::registry::{ProviderKind, ProviderSpec};
use crate::traits::{CompletionCall, Extraction, RawCompletion, ScriptProvider};

const VALIDATION_PROMPT: &str = "ping";

/// Finish reasons that mean the candidate was filtered rather than finished.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<RequestContent<'a>>,
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, system_instruction: Option<&'a str>, max_tokens: u32) -> Self {
        Self {
            system_instruction: system_instruction.map(|text| RequestContent {
                role: None,
                parts: vec![RequestPart { text }],
            }),
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
            },
        }
    }
}

/// Response of `POST /models/{model}:generateContent`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub role: Option<String>,
}

/// A response part; non-text parts (inline data, function calls) have no `text`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

/// Concatenate the text parts of the first candidate, in order.
///
/// A prompt-level block wins over everything. A first candidate with no text
/// and a filtering finish reason is a block; otherwise no text is `Empty`.
pub fn extract_text(resp: &GenerateContentResponse) -> Extraction {
    if let Some(feedback) = &resp.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            let reason = match &feedback.block_reason_message {
                Some(msg) => format!("{reason}: {msg}"),
                None => reason.clone(),
            };
            return Extraction::Blocked { reason };
        }
    }

    let Some(candidate) = resp.candidates.first() else {
        return Extraction::Empty;
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if !text.is_empty() {
        return Extraction::Text(text);
    }

    match candidate.finish_reason.as_deref() {
        Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason) => Extraction::Blocked {
            reason: reason.to_string(),
        },
        _ => Extraction::Empty,
    }
}

/// Gemini reports a bad key as `400 INVALID_ARGUMENT` with reason `API_KEY_INVALID`.
fn is_invalid_key_body(body: &Value) -> bool {
    let reason_invalid = body
        .pointer("/error/details")
        .and_then(Value::as_array)
        .is_some_and(|details| {
            details
                .iter()
                .any(|d| d.get("reason").and_then(Value::as_str) == Some("API_KEY_INVALID"))
        });
    let status_unauthenticated =
        body.pointer("/error/status").and_then(Value::as_str) == Some("UNAUTHENTICATED");

    reason_invalid || status_unauthenticated
}

// ─────────────────────────────────────────────
// GeminiProvider
// ─────────────────────────────────────────────

/// Calls the Generative Language API. The key travels in `x-goog-api-key`,
/// never in the URL.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: Url,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

impl GeminiProvider {
    /// Create a provider; `config.api_base` overrides the public endpoint.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let base = config
            .api_base
            .as_deref()
            .unwrap_or(ProviderKind::Gemini.spec().default_api_base);
        let api_base = Url::parse(base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ProviderError::Client(format!("invalid Gemini API base: {base}")))?;

        Ok(Self {
            client: build_client(timeout)?,
            api_base,
        })
    }

    /// `{base}/models/{model}:generateContent`, with the model kept as one
    /// percent-encoded path segment.
    fn generate_url(&self, model: &str) -> Result<Url, ProviderError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Client(format!("invalid Gemini API base: {}", self.api_base)))?
            .pop_if_empty()
            .push("models")
            .push(&format!("{model}:generateContent"));
        Ok(url)
    }

    async fn post_generate(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
        credential: &str,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            credential_header(self.display_name(), credential)?,
        );

        let request = self
            .client
            .post(self.generate_url(model)?)
            .headers(headers)
            .json(body);

        send_json(self.display_name(), request, is_invalid_key_body).await
    }
}

#[async_trait]
impl ScriptProvider for GeminiProvider {
    fn spec(&self) -> &'static ProviderSpec {
        ProviderKind::Gemini.spec()
    }

    async fn generate(&self, call: &CompletionCall<'_>) -> Result<RawCompletion, ProviderError> {
        debug!(
            provider = self.display_name(),
            model = call.model,
            max_tokens = call.max_tokens,
            "Calling LLM"
        );

        let system = Some(call.system_instruction).filter(|s| !s.is_empty());
        let body = GenerateContentRequest::new(call.prompt, system, call.max_tokens);

        let resp = self.post_generate(call.model, &body, call.credential).await?;
        debug!(
            provider = self.display_name(),
            candidates = resp.candidates.len(),
            "LLM response received"
        );
        Ok(RawCompletion::GenerateContent(resp))
    }

    async fn validate(&self, credential: &str) -> Result<(), ProviderError> {
        let body = GenerateContentRequest::new(VALIDATION_PROMPT, None, 1);
        self.post_generate(self.spec().validation_model, &body, credential)
            .await
            .map(|_| ())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
