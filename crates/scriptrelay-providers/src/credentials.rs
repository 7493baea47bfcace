//! Credential resolution.
//!
//! A request-supplied credential always wins. Without one, the provider's
//! process-wide fallback is used: the configured `apiKey` first, then the
//! provider's environment variable, read at call time.

use std::collections::HashMap;
use std::sync::Arc;

use scriptrelay_core::config::ProvidersConfig;

use crate::registry::{ProviderKind, ProviderSpec, PROVIDERS};

/// Variable lookup used for the environment tier.
type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Fallback credentials for each provider.
#[derive(Clone, Default)]
pub struct CredentialStore {
    configured: HashMap<ProviderKind, String>,
    env_lookup: Option<EnvLookup>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let configured: Vec<_> = self.configured.keys().collect();
        f.debug_struct("CredentialStore")
            .field("configured", &configured)
            .field("reads_env", &self.env_lookup.is_some())
            .finish()
    }
}

impl CredentialStore {
    /// Fallbacks from the config file, with the process environment as a
    /// second tier.
    pub fn from_config(providers: &ProvidersConfig) -> Self {
        Self::with_env_lookup(providers, |name| std::env::var(name).ok())
    }

    /// Like [`from_config`](Self::from_config), but the environment tier
    /// reads through `lookup`.
    pub fn with_env_lookup(
        providers: &ProvidersConfig,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        let configured = PROVIDERS
            .iter()
            .filter_map(|spec| {
                providers
                    .get_by_name(spec.name)
                    .filter(|cfg| cfg.is_configured())
                    .map(|cfg| (spec.kind, cfg.api_key.clone()))
            })
            .collect();

        Self {
            configured,
            env_lookup: Some(Arc::new(lookup)),
        }
    }

    /// Fixed fallbacks only; the environment is never consulted.
    pub fn from_map(configured: HashMap<ProviderKind, String>) -> Self {
        let configured = configured
            .into_iter()
            .filter(|(_, key)| !key.trim().is_empty())
            .collect();
        Self {
            configured,
            env_lookup: None,
        }
    }

    /// No fallbacks at all. Every request must bring its own credential.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The process-wide fallback for a provider, if any.
    pub fn fallback(&self, spec: &ProviderSpec) -> Option<String> {
        if let Some(key) = self.configured.get(&spec.kind) {
            return Some(key.clone());
        }
        let lookup = self.env_lookup.as_deref()?;
        lookup(spec.env_key).filter(|key| !key.trim().is_empty())
    }

    /// Pick the credential for one call. A blank request value counts as absent.
    pub fn resolve(&self, request_credential: Option<&str>, spec: &ProviderSpec) -> Option<String> {
        match request_credential.filter(|c| !c.trim().is_empty()) {
            Some(credential) => Some(credential.to_string()),
            None => self.fallback(spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptrelay_core::config::ProviderConfig;

    fn claude() -> &'static ProviderSpec {
        ProviderKind::Claude.spec()
    }

    fn gemini() -> &'static ProviderSpec {
        ProviderKind::Gemini.spec()
    }

    fn configured_claude(key: &str) -> ProvidersConfig {
        ProvidersConfig {
            claude: ProviderConfig {
                api_key: key.to_string(),
                api_base: None,
            },
            gemini: ProviderConfig::default(),
        }
    }

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_request_credential_wins_over_fallback() {
        let store = CredentialStore::from_map(HashMap::from([(
            ProviderKind::Claude,
            "sk-ant-fallback".to_string(),
        )]));
        assert_eq!(
            store.resolve(Some("sk-ant-request"), claude()).as_deref(),
            Some("sk-ant-request")
        );
    }

    #[test]
    fn test_fallback_used_when_request_has_none() {
        let store = CredentialStore::from_map(HashMap::from([(
            ProviderKind::Gemini,
            "AIza-fallback".to_string(),
        )]));
        assert_eq!(store.resolve(None, gemini()).as_deref(), Some("AIza-fallback"));
        assert_eq!(store.resolve(Some(""), gemini()).as_deref(), Some("AIza-fallback"));
        assert_eq!(store.resolve(Some("  \t"), gemini()).as_deref(), Some("AIza-fallback"));
        assert!(store.resolve(None, claude()).is_none());
    }

    #[test]
    fn test_empty_store() {
        let store = CredentialStore::empty();
        assert!(store.resolve(None, claude()).is_none());
        assert!(store.resolve(Some(""), gemini()).is_none());
        assert_eq!(store.resolve(Some("k"), gemini()).as_deref(), Some("k"));
    }

    #[test]
    fn test_from_map_drops_empty_keys() {
        let store = CredentialStore::from_map(HashMap::from([(ProviderKind::Claude, String::new())]));
        assert!(store.fallback(claude()).is_none());
    }

    #[test]
    fn test_from_config_takes_configured_keys() {
        let providers = ProvidersConfig {
            claude: ProviderConfig {
                api_key: "sk-ant-config".to_string(),
                api_base: None,
            },
            gemini: ProviderConfig::default(),
        };
        let store = CredentialStore::from_config(&providers);
        assert_eq!(store.fallback(claude()).as_deref(), Some("sk-ant-config"));
    }

    #[test]
    fn test_configured_key_beats_env() {
        let store = CredentialStore::with_env_lookup(
            &configured_claude("sk-ant-config"),
            env_of(&[("ANTHROPIC_API_KEY", "sk-ant-env")]),
        );
        assert_eq!(store.fallback(claude()).as_deref(), Some("sk-ant-config"));
        assert_eq!(store.resolve(None, claude()).as_deref(), Some("sk-ant-config"));
    }

    #[test]
    fn test_env_used_when_nothing_configured() {
        let store = CredentialStore::with_env_lookup(
            &ProvidersConfig::default(),
            env_of(&[
                ("ANTHROPIC_API_KEY", "sk-ant-env"),
                ("GEMINI_API_KEY", "AIza-env"),
            ]),
        );
        assert_eq!(store.resolve(None, claude()).as_deref(), Some("sk-ant-env"));
        assert_eq!(store.resolve(Some(""), gemini()).as_deref(), Some("AIza-env"));
        assert_eq!(store.resolve(Some("AIza-req"), gemini()).as_deref(), Some("AIza-req"));
    }

    #[test]
    fn test_blank_env_value_is_absent() {
        let store = CredentialStore::with_env_lookup(
            &ProvidersConfig::default(),
            env_of(&[("ANTHROPIC_API_KEY", "   "), ("GEMINI_API_KEY", "")]),
        );
        assert!(store.fallback(claude()).is_none());
        assert!(store.fallback(gemini()).is_none());
        assert!(store.resolve(Some(" "), claude()).is_none());
    }

    #[test]
    fn test_from_map_never_reads_env() {
        let store = CredentialStore::from_map(HashMap::new());
        assert!(store.fallback(claude()).is_none());
        assert!(store.fallback(gemini()).is_none());
    }

    #[test]
    fn test_debug_hides_keys() {
        let store = CredentialStore::from_map(HashMap::from([(
            ProviderKind::Claude,
            "sk-ant-secret".to_string(),
        )]));
        let debug = format!("{:?}", store);
        assert!(!debug.contains("sk-ant-secret"));
    }
}
