//! One live client per supported provider.

use std::sync::Arc;

use scriptrelay_core::config::Config;
use tracing::debug;

use crate::anthropic::ClaudeProvider;
use crate::error::ProviderError;
use crate::gemini::GeminiProvider;
use crate::registry::ProviderKind;
use crate::traits::ScriptProvider;

/// The provider table the dispatcher and validator route into.
#[derive(Clone)]
pub struct ProviderSet {
    claude: Arc<dyn ScriptProvider>,
    gemini: Arc<dyn ScriptProvider>,
}

impl ProviderSet {
    pub fn new(claude: Arc<dyn ScriptProvider>, gemini: Arc<dyn ScriptProvider>) -> Self {
        Self { claude, gemini }
    }

    /// Build real clients, honoring `apiBase` overrides and `http.timeoutSecs`.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let timeout = config.http.timeout();
        debug!(timeout_secs = timeout.as_secs(), "Building provider clients");

        let claude = ClaudeProvider::new(&config.providers.claude, timeout)?;
        let gemini = GeminiProvider::new(&config.providers.gemini, timeout)?;
        Ok(Self::new(Arc::new(claude), Arc::new(gemini)))
    }

    pub fn get(&self, kind: ProviderKind) -> &Arc<dyn ScriptProvider> {
        match kind {
            ProviderKind::Claude => &self.claude,
            ProviderKind::Gemini => &self.gemini,
        }
    }
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("claude", &self.claude.display_name())
            .field("gemini", &self.gemini.display_name())
            .finish()
    }
}
