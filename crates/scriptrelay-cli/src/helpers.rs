//! Shared CLI helpers: service wiring, JSON output, version banner.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use scriptrelay_core::config::Config;
use scriptrelay_providers::{CredentialStore, KeyValidator, ProviderSet, ScriptGenerator};

/// Build the dispatcher and validator from the loaded configuration.
pub fn build_services(config: &Config) -> Result<(ScriptGenerator, KeyValidator)> {
    let providers = ProviderSet::from_config(config).context("failed to build provider clients")?;
    let credentials = CredentialStore::from_config(&config.providers);

    Ok((
        ScriptGenerator::new(providers.clone(), credentials),
        KeyValidator::new(providers),
    ))
}

/// Print an envelope as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize response")?;
    println!("{json}");
    Ok(())
}

/// Print the banner shown at server start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🎬 Scriptrelay".cyan().bold(), version.dimmed());
    println!("{}", "Press Ctrl+C to stop.".dimmed());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptrelay_core::ResponseEnvelope;

    #[test]
    fn build_services_from_defaults() {
        assert!(build_services(&Config::default()).is_ok());
    }

    #[test]
    fn print_json_envelope() {
        assert!(print_json(&ResponseEnvelope::success("script")).is_ok());
    }
}
