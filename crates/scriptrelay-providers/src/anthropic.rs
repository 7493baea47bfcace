//! Anthropic Messages API client (`claude-` models).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use scriptrelay_core::config::ProviderConfig;

use crate::error::ProviderError;
use crate::http::{build_client, credential_header, send_json};
use crate::registry::{ProviderKind, ProviderSpec};
use crate::traits::{CompletionCall, Extraction, RawCompletion, ScriptProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Prompt used for credential checks.
const VALIDATION_PROMPT: &str = "ping";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> UserMessage<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Response of `POST /v1/messages`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// One content block; only `type == "text"` blocks carry script text.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            block_type: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Concatenate every text block, in order.
///
/// An empty result with `stop_reason == "refusal"` is a block, not empty output.
pub fn extract_text(resp: &MessagesResponse) -> Extraction {
    let text: String = resp
        .content
        .iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();

    if !text.is_empty() {
        return Extraction::Text(text);
    }

    match resp.stop_reason.as_deref() {
        Some("refusal") => Extraction::Blocked {
            reason: "refusal".to_string(),
        },
        _ => Extraction::Empty,
    }
}

// ─────────────────────────────────────────────
// ClaudeProvider
// ─────────────────────────────────────────────

/// Calls the Anthropic Messages API. Holds no credential; each call brings one.
pub struct ClaudeProvider {
    client: reqwest::Client,
    api_base: String,
}

impl std::fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ClaudeProvider {
    /// Create a provider; `config.api_base` overrides the public endpoint.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| ProviderKind::Claude.spec().default_api_base.to_string());

        Ok(Self {
            client: build_client(timeout)?,
            api_base,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }

    fn headers(&self, credential: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", credential_header(self.display_name(), credential)?);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        Ok(headers)
    }

    async fn post_messages(
        &self,
        body: &MessagesRequest<'_>,
        credential: &str,
    ) -> Result<MessagesResponse, ProviderError> {
        let request = self
            .client
            .post(self.messages_url())
            .headers(self.headers(credential)?)
            .json(body);

        send_json(self.display_name(), request, |_| false).await
    }
}

#[async_trait]
impl ScriptProvider for ClaudeProvider {
    fn spec(&self) -> &'static ProviderSpec {
        ProviderKind::Claude.spec()
    }

    async fn generate(&self, call: &CompletionCall<'_>) -> Result<RawCompletion, ProviderError> {
        debug!(
            provider = self.display_name(),
            model = call.model,
            max_tokens = call.max_tokens,
            "Calling LLM"
        );

        let body = MessagesRequest {
            model: call.model,
            max_tokens: call.max_tokens,
            system: Some(call.system_instruction).filter(|s| !s.is_empty()),
            messages: vec![UserMessage::new(call.prompt)],
        };

        let resp = self.post_messages(&body, call.credential).await?;
        debug!(
            provider = self.display_name(),
            blocks = resp.content.len(),
            stop_reason = resp.stop_reason.as_deref().unwrap_or("?"),
            "LLM response received"
        );
        Ok(RawCompletion::Messages(resp))
    }

    async fn validate(&self, credential: &str) -> Result<(), ProviderError> {
        let body = MessagesRequest {
            model: self.spec().validation_model,
            max_tokens: 1,
            system: None,
            messages: vec![UserMessage::new(VALIDATION_PROMPT)],
        };

        self.post_messages(&body, credential).await.map(|_| ())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
