//! Scriptrelay CLI: entry point.
//!
//! # Commands
//!
//! - `scriptrelay serve [--host H] [--port P]`: run the HTTP relay
//! - `scriptrelay generate -m MODEL [-p PROMPT]`: one generation, envelope on stdout
//! - `scriptrelay validate PROVIDER [--api-key KEY]`: check a credential
//! - `scriptrelay onboard`: initialize config
//! - `scriptrelay status`: show configuration and provider status

mod helpers;
mod onboard;
mod server;
mod status;

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use scriptrelay_core::config::load_config;
use scriptrelay_core::{GenerationRequest, ValidationEnvelope};
use scriptrelay_providers::{find_by_name, CredentialStore};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🎬 Scriptrelay: script-generation relay for Claude and Gemini
#[derive(Parser)]
#[command(name = "scriptrelay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP relay
    Serve {
        /// Listen host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Generate one script and print the response envelope
    Generate {
        /// Model identifier, e.g. claude-3-5-sonnet-20240620 or gemini-1.5-pro
        #[arg(short, long)]
        model: String,

        /// Prompt text. Read from stdin when omitted.
        #[arg(short, long)]
        prompt: Option<String>,

        /// API key for this call (overrides configured fallback)
        #[arg(long)]
        api_key: Option<String>,

        /// System instruction override
        #[arg(short, long)]
        system: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Check an API key against its provider
    Validate {
        /// Provider: claude (anthropic) or gemini (google)
        provider: String,

        /// Key to check. Defaults to the configured fallback.
        #[arg(long)]
        api_key: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Initialize configuration
    Onboard,

    /// Show configuration and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, logs } => {
            init_logging(logs);
            server::run(host, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate {
            model,
            prompt,
            api_key,
            system,
            logs,
        } => {
            init_logging(logs);
            run_generate(model, prompt, api_key, system).await
        }
        Commands::Validate {
            provider,
            api_key,
            logs,
        } => {
            init_logging(logs);
            run_validate(&provider, api_key).await
        }
        Commands::Onboard => onboard::run().map(|_| ExitCode::SUCCESS),
        Commands::Status => status::run().map(|_| ExitCode::SUCCESS),
    }
}

// ─────────────────────────────────────────────
// One-shot commands
// ─────────────────────────────────────────────

async fn run_generate(
    model: String,
    prompt: Option<String>,
    api_key: Option<String>,
    system: Option<String>,
) -> Result<ExitCode> {
    let prompt = match prompt {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            buf
        }
    };

    let config = load_config(None);
    let (generator, _) = helpers::build_services(&config)?;

    let mut request = GenerationRequest::new(prompt, model);
    request.credential = api_key;
    request.system_instruction = system;

    info!(model = %request.model_identifier, "processing single generation");
    let envelope = generator.generate(&request).await;
    helpers::print_json(&envelope)?;

    Ok(exit_code(envelope.success))
}

async fn run_validate(selector: &str, api_key: Option<String>) -> Result<ExitCode> {
    let spec = find_by_name(selector).with_context(|| {
        format!("unknown provider '{}' (expected claude or gemini)", selector)
    })?;

    let config = load_config(None);
    let (_, validator) = helpers::build_services(&config)?;

    let credential = match api_key {
        Some(key) => key,
        None => CredentialStore::from_config(&config.providers)
            .fallback(spec)
            .unwrap_or_default(),
    };

    let result = validator.validate(spec.kind, &credential).await;
    let valid = result.valid;
    helpers::print_json(&ValidationEnvelope::from(result))?;

    Ok(exit_code(valid))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Initialize tracing/logging. `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("scriptrelay=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
