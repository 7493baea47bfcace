//! `scriptrelay status`: show configuration and provider status.
//!
//! - Shows config path, listen address, upstream timeout
//! - Shows which providers have a fallback credential, and where it comes from

use anyhow::Result;
use colored::Colorize;

use scriptrelay_core::config::{get_config_path, load_config, ProviderConfig};
use scriptrelay_core::utils::mask_secret;
use scriptrelay_providers::{ProviderSpec, PROVIDERS};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🎬 Scriptrelay Status".cyan().bold());
    println!();

    let config_exists = config_path.exists();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    println!(
        "  {:<18} {}:{}",
        "Listen:".bold(),
        config.server.host,
        config.server.port
    );
    println!(
        "  {:<18} {}s",
        "Upstream timeout:".bold(),
        config.http.timeout_secs
    );

    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let provider_config = config.providers.get_by_name(spec.name);
        let env_value = std::env::var(spec.env_key).ok();
        println!(
            "    {:<12} {:<10} {}",
            spec.display_name,
            spec.model_prefix.dimmed(),
            credential_status(spec, provider_config, env_value.as_deref())
        );
    }

    println!();

    Ok(())
}

/// One-line description of where a provider's fallback credential comes from.
fn credential_status(
    spec: &ProviderSpec,
    config: Option<&ProviderConfig>,
    env_value: Option<&str>,
) -> String {
    if let Some(cfg) = config.filter(|c| c.is_configured()) {
        return format!("{} config ({})", "✓".green(), mask_secret(&cfg.api_key));
    }
    match env_value.filter(|v| !v.trim().is_empty()) {
        Some(value) => format!("{} ${} ({})", "✓".green(), spec.env_key, mask_secret(value)),
        None => format!(
            "{}",
            format!("· no fallback key (requests must send one, or set {})", spec.env_key)
                .dimmed()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptrelay_providers::ProviderKind;

    #[test]
    fn status_prefers_config_and_masks() {
        let spec = ProviderKind::Claude.spec();
        let cfg = ProviderConfig {
            api_key: "sk-ant-0123456789abcd".to_string(),
            api_base: None,
        };
        let line = credential_status(spec, Some(&cfg), Some("sk-ant-env-value-xyz"));
        assert!(line.contains("abcd"));
        assert!(!line.contains("sk-ant-0123"));
        assert!(!line.contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn status_falls_back_to_env() {
        let spec = ProviderKind::Gemini.spec();
        let line = credential_status(spec, None, Some("AIza-0000-1111-2222"));
        assert!(line.contains("$GEMINI_API_KEY"));
        assert!(!line.contains("AIza-0000"));
    }

    #[test]
    fn status_without_any_key() {
        let spec = ProviderKind::Gemini.spec();
        let line = credential_status(spec, Some(&ProviderConfig::default()), None);
        assert!(line.contains("GEMINI_API_KEY"));
    }
}
