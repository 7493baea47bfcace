//! Provider layer for Scriptrelay.
//!
//! Direct HTTP clients for the two supported LLM vendors, plus the
//! dispatcher and key validator built on top of them.
//!
//! # Architecture
//!
//! - [`traits::ScriptProvider`]: trait both providers implement
//! - [`registry`]: static specs, model-prefix resolution
//! - [`anthropic::ClaudeProvider`], [`gemini::GeminiProvider`]: the clients
//! - [`credentials::CredentialStore`]: request credential, else fallback
//! - [`dispatcher::ScriptGenerator`]: request in, envelope out
//! - [`validator::KeyValidator`]: one-token credential checks

pub mod anthropic;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod gemini;
mod http;
pub mod prompts;
pub mod provider_set;
pub mod registry;
pub mod traits;
pub mod validator;

// Re-export main types for convenience
pub use anthropic::ClaudeProvider;
pub use credentials::CredentialStore;
pub use dispatcher::ScriptGenerator;
pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use provider_set::ProviderSet;
pub use registry::{find_by_name, resolve_provider, ProviderKind, ProviderSpec, PROVIDERS};
pub use traits::{CompletionCall, Extraction, RawCompletion, ScriptProvider};
pub use validator::KeyValidator;
