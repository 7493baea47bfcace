//! `scriptrelay onboard`: create `~/.scriptrelay/config.json` with defaults.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use scriptrelay_core::config::{get_config_path, save_config, Config};
use scriptrelay_providers::PROVIDERS;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🎬 Scriptrelay — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    if ensure_config(&config_path)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    println!();
    println!("  Add fallback API keys under {} or export:", "providers".bold());
    for spec in PROVIDERS {
        println!("    {:<20} for {}* models", spec.env_key, spec.model_prefix);
    }
    println!();
    println!(
        "{}",
        "  Setup complete! Run `scriptrelay serve` to start the relay.".green()
    );
    println!();

    Ok(())
}

/// Write a default config unless one exists. Returns whether it was created.
fn ensure_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))?;
    Ok(true)
}
