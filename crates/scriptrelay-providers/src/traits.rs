//! `ScriptProvider` trait: the seam between the dispatcher and each
//! concrete LLM backend.
//!
//! Providers return their native response shape ([`RawCompletion`]); turning
//! it into text is a per-provider adapter behind [`RawCompletion::extract_text`].

use async_trait::async_trait;

use crate::anthropic::MessagesResponse;
use crate::error::ProviderError;
use crate::gemini::GenerateContentResponse;
use crate::registry::ProviderSpec;

/// Everything a provider needs for one generation call.
#[derive(Clone, Debug)]
pub struct CompletionCall<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system_instruction: &'a str,
    pub max_tokens: u32,
    pub credential: &'a str,
}

/// A provider's response, in that provider's own shape.
#[derive(Clone, Debug)]
pub enum RawCompletion {
    /// Anthropic: list of content blocks.
    Messages(MessagesResponse),
    /// Gemini: list of candidates, each with parts.
    GenerateContent(GenerateContentResponse),
}

/// What text extraction found in a completion.
#[derive(Clone, Debug, PartialEq)]
pub enum Extraction {
    /// Concatenated text segments, in provider order.
    Text(String),
    /// The call succeeded but carried no text.
    Empty,
    /// The provider refused or filtered the request.
    Blocked { reason: String },
}

impl RawCompletion {
    pub fn extract_text(&self) -> Extraction {
        match self {
            RawCompletion::Messages(resp) => crate::anthropic::extract_text(resp),
            RawCompletion::GenerateContent(resp) => crate::gemini::extract_text(resp),
        }
    }
}

/// Trait implemented once per supported provider.
#[async_trait]
pub trait ScriptProvider: Send + Sync {
    /// Static spec (name, defaults) for this provider.
    fn spec(&self) -> &'static ProviderSpec;

    /// Issue one completion request. Exactly one upstream call, no retries.
    async fn generate(&self, call: &CompletionCall<'_>) -> Result<RawCompletion, ProviderError>;

    /// Check the credential with the cheapest authenticated call.
    ///
    /// `Ok(())` only for an explicit successful response.
    async fn validate(&self, credential: &str) -> Result<(), ProviderError>;

    /// Display name for logging.
    fn display_name(&self) -> &'static str {
        self.spec().display_name
    }
}
