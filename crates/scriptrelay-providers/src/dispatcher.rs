//! Script generator: routes a [`GenerationRequest`] to its provider and
//! turns whatever happens into a [`ResponseEnvelope`].
//!
//! Decision order:
//! 1. unknown model prefix → `unsupported_model`, no network call
//! 2. no credential anywhere → `missing_credential`, no network call
//! 3. one upstream call; failures are classified by [`ProviderError::kind`]
//! 4. text extraction: text → success, nothing → success with placeholder,
//!    refusal → `blocked`

use tracing::{debug, info, warn};

use scriptrelay_core::utils::{redact, redact_json};
use scriptrelay_core::{ErrorKind, GenerationRequest, ResponseEnvelope, EMPTY_SCRIPT_PLACEHOLDER};

use crate::credentials::CredentialStore;
use crate::error::ProviderError;
use crate::provider_set::ProviderSet;
use crate::registry::{known_prefixes, resolve_provider, ProviderSpec};
use crate::traits::{CompletionCall, Extraction};

/// The dispatcher. Cheap to share behind an `Arc`; holds no per-request state.
#[derive(Clone, Debug)]
pub struct ScriptGenerator {
    providers: ProviderSet,
    credentials: CredentialStore,
}

impl ScriptGenerator {
    pub fn new(providers: ProviderSet, credentials: CredentialStore) -> Self {
        Self {
            providers,
            credentials,
        }
    }

    /// Generate a script. Never fails: every outcome is an envelope.
    pub async fn generate(&self, request: &GenerationRequest) -> ResponseEnvelope {
        let model = request.model_identifier.as_str();

        let Some(spec) = resolve_provider(model) else {
            warn!(model, "Unsupported model identifier");
            return ResponseEnvelope::failure(
                ErrorKind::UnsupportedModel,
                format!(
                    "Unsupported model identifier '{}'. Supported prefixes: {}.",
                    model,
                    known_prefixes()
                ),
            );
        };

        let Some(credential) = self
            .credentials
            .resolve(request.credential.as_deref(), spec)
        else {
            warn!(provider = spec.display_name, "No credential available");
            return ResponseEnvelope::failure(
                ErrorKind::MissingCredential,
                format!(
                    "{} API key is missing. Provide one in the request or set {}.",
                    spec.display_name, spec.env_key
                ),
            );
        };

        let call = CompletionCall {
            model,
            prompt: &request.prompt,
            system_instruction: effective_system_instruction(request, spec),
            max_tokens: spec.max_output_tokens,
            credential: &credential,
        };

        info!(
            provider = spec.display_name,
            model,
            prompt_len = request.prompt.len(),
            "Generating script"
        );

        let provider = self.providers.get(spec.kind);
        match provider.generate(&call).await {
            Ok(raw) => match raw.extract_text() {
                Extraction::Text(script) => {
                    debug!(provider = spec.display_name, script_len = script.len(), "Script generated");
                    ResponseEnvelope::success(script)
                }
                Extraction::Empty => {
                    warn!(provider = spec.display_name, model, "Provider returned no text content");
                    ResponseEnvelope::success(EMPTY_SCRIPT_PLACEHOLDER)
                }
                Extraction::Blocked { reason } => {
                    let err = ProviderError::Blocked {
                        provider: spec.display_name,
                        reason,
                    };
                    warn!(provider = spec.display_name, error = %err, "Request blocked");
                    failure_envelope(&err, &credential)
                }
            },
            Err(err) => {
                warn!(
                    provider = spec.display_name,
                    error_type = %err.kind(),
                    "Script generation failed"
                );
                failure_envelope(&err, &credential)
            }
        }
    }
}

/// The request override when it has content, else the provider default.
pub fn effective_system_instruction<'a>(
    request: &'a GenerationRequest,
    spec: &'static ProviderSpec,
) -> &'a str {
    request
        .system_instruction
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(spec.default_system_instruction)
}

/// Convert a classified failure into an envelope with the credential scrubbed.
fn failure_envelope(err: &ProviderError, credential: &str) -> ResponseEnvelope {
    let kind = err.kind();
    let message = match kind {
        ErrorKind::Unexpected => format!(
            "An unexpected error occurred while generating the script ({}): {}",
            err.type_name(),
            err
        ),
        _ => err.to_string(),
    };

    let envelope = ResponseEnvelope::failure(kind, redact(&message, credential));
    match err.raw() {
        Some(raw) => envelope.with_raw_error(redact_json(raw, credential)),
        None => envelope,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
