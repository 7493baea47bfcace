//! Provider registry: static specs for the two supported LLM providers.
//!
//! Each `ProviderSpec` describes how a model family is recognized (by its
//! identifier prefix) and which defaults apply to it: the system instruction,
//! the output-token budget, and the model used for credential checks.

use serde::{Deserialize, Serialize};

use crate::prompts::DEFAULT_SCRIPT_INSTRUCTION;

/// The fixed set of supported providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API (`claude-` models).
    Claude,
    /// Google Generative Language API (`gemini-` models).
    Gemini,
}

impl ProviderKind {
    pub fn spec(&self) -> &'static ProviderSpec {
        match self {
            ProviderKind::Claude => &PROVIDERS[0],
            ProviderKind::Gemini => &PROVIDERS[1],
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.spec().name)
    }
}

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Internal name, also the config section (e.g. `"claude"`).
    pub name: &'static str,
    /// Extra selector names accepted on the validation route.
    pub aliases: &'static [&'static str],
    /// Human-readable name for logs and error messages.
    pub display_name: &'static str,
    /// Model identifiers starting with this prefix belong to this provider.
    pub model_prefix: &'static str,
    /// Process-wide fallback credential variable.
    pub env_key: &'static str,
    pub default_api_base: &'static str,
    /// Output-token budget for script generation.
    pub max_output_tokens: u32,
    /// Cheap model used for one-token credential checks.
    pub validation_model: &'static str,
    pub default_system_instruction: &'static str,
}

/// Supported providers. Indexed by [`ProviderKind::spec`]; keep the order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        kind: ProviderKind::Claude,
        name: "claude",
        aliases: &["anthropic"],
        display_name: "Anthropic",
        model_prefix: "claude-",
        env_key: "ANTHROPIC_API_KEY",
        default_api_base: "https://api.anthropic.com",
        max_output_tokens: 4096,
        validation_model: "claude-3-haiku-20240307",
        default_system_instruction: DEFAULT_SCRIPT_INSTRUCTION,
    },
    ProviderSpec {
        kind: ProviderKind::Gemini,
        name: "gemini",
        aliases: &["google"],
        display_name: "Gemini",
        model_prefix: "gemini-",
        env_key: "GEMINI_API_KEY",
        default_api_base: "https://generativelanguage.googleapis.com/v1beta",
        max_output_tokens: 8192,
        validation_model: "gemini-1.5-flash",
        default_system_instruction: DEFAULT_SCRIPT_INSTRUCTION,
    },
];

// ─────────────────────────────────────────────
// Matching functions
// ─────────────────────────────────────────────

/// Find the provider owning a model identifier.
///
/// Prefix match, case-sensitive (the identifier is forwarded verbatim).
/// When several prefixes match, the longest one wins.
pub fn resolve_provider(model_identifier: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS
        .iter()
        .filter(|spec| model_identifier.starts_with(spec.model_prefix))
        .max_by_key(|spec| spec.model_prefix.len())
}

/// Find a provider spec by name or alias (case-insensitive).
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    let name = name.trim().to_lowercase();
    PROVIDERS
        .iter()
        .find(|spec| spec.name == name || spec.aliases.contains(&name.as_str()))
}

/// Comma-separated list of known prefixes, for error messages.
pub fn known_prefixes() -> String {
    PROVIDERS
        .iter()
        .map(|spec| spec.model_prefix)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_claude() {
        let spec = resolve_provider("claude-3-5-sonnet-20240620").unwrap();
        assert_eq!(spec.kind, ProviderKind::Claude);
        assert_eq!(spec.env_key, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_resolve_gemini() {
        let spec = resolve_provider("gemini-1.5-pro").unwrap();
        assert_eq!(spec.kind, ProviderKind::Gemini);
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(resolve_provider("gpt-4o").is_none());
        assert!(resolve_provider("").is_none());
        // Prefix must be at the start, dash included
        assert!(resolve_provider("my-claude-3").is_none());
        assert!(resolve_provider("claude").is_none());
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        assert!(resolve_provider("Claude-3-opus").is_none());
    }

    #[test]
    fn test_find_by_name_and_alias() {
        assert_eq!(find_by_name("claude").unwrap().kind, ProviderKind::Claude);
        assert_eq!(find_by_name("Anthropic").unwrap().kind, ProviderKind::Claude);
        assert_eq!(find_by_name("gemini").unwrap().kind, ProviderKind::Gemini);
        assert_eq!(find_by_name(" google ").unwrap().kind, ProviderKind::Gemini);
        assert!(find_by_name("openai").is_none());
    }

    #[test]
    fn test_kind_spec_matches_table() {
        for spec in PROVIDERS {
            assert_eq!(spec.kind.spec().name, spec.name);
        }
    }

    #[test]
    fn test_prefixes_do_not_overlap() {
        for a in PROVIDERS {
            for b in PROVIDERS {
                if a.name != b.name {
                    assert!(!a.model_prefix.starts_with(b.model_prefix));
                }
            }
        }
    }

    #[test]
    fn test_defaults_are_sane() {
        for spec in PROVIDERS {
            assert!(spec.max_output_tokens > 0);
            assert!(spec.validation_model.starts_with(spec.model_prefix));
            assert!(!spec.default_system_instruction.is_empty());
        }
    }

    #[test]
    fn test_known_prefixes() {
        assert_eq!(known_prefixes(), "claude-, gemini-");
    }
}
