//! Config loader: reads `~/.scriptrelay/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.scriptrelay/config.json`
//! 3. Environment variables `SCRIPTRELAY_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Errors from writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<(), ConfigError> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `SCRIPTRELAY_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `SCRIPTRELAY_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `SCRIPTRELAY_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `SCRIPTRELAY_SERVER__HOST` → `server.host`
/// - `SCRIPTRELAY_SERVER__PORT` → `server.port`
/// - `SCRIPTRELAY_HTTP__TIMEOUT_SECS` → `http.timeout_secs`
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup.
fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    apply_provider_overrides(&mut config.providers.claude, "CLAUDE", &lookup);
    apply_provider_overrides(&mut config.providers.gemini, "GEMINI", &lookup);

    if let Some(val) = lookup("SCRIPTRELAY_SERVER__HOST") {
        config.server.host = val;
    }
    if let Some(val) = lookup("SCRIPTRELAY_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }
    if let Some(val) = lookup("SCRIPTRELAY_HTTP__TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(n) if n > 0 => config.http.timeout_secs = n,
            _ => warn!("Ignoring SCRIPTRELAY_HTTP__TIMEOUT_SECS={val}: expected a positive number of seconds"),
        }
    }

    config
}

/// Apply overrides for a single provider.
fn apply_provider_overrides(
    provider: &mut super::schema::ProviderConfig,
    name: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) {
    if let Some(val) = lookup(&format!("SCRIPTRELAY_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Some(val) = lookup(&format!("SCRIPTRELAY_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.http.timeout_secs, 60);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(r#"{
            "providers": {
                "claude": { "apiKey": "sk-ant-123" }
            },
            "http": { "timeoutSecs": 15 }
        }"#);

        let config = load_config_from_path(file.path());
        assert_eq!(config.providers.claude.api_key, "sk-ant-123");
        assert_eq!(config.http.timeout_secs, 15);
        // Default preserved
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.http.timeout_secs, 60);
        assert!(!config.providers.gemini.is_configured());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.providers.gemini.api_key = "AIza-test".to_string();
        config.server.port = 8123;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.providers.gemini.api_key, "AIza-test");
        assert_eq!(reloaded.server.port, 8123);
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_override_provider_key_and_base() {
        let lookup = lookup_from(&[
            ("SCRIPTRELAY_PROVIDERS__CLAUDE__API_KEY", "sk-env-key"),
            ("SCRIPTRELAY_PROVIDERS__GEMINI__API_BASE", "http://localhost:1234"),
        ]);
        let config = apply_overrides(Config::default(), lookup);
        assert_eq!(config.providers.claude.api_key, "sk-env-key");
        assert_eq!(
            config.providers.gemini.api_base.as_deref(),
            Some("http://localhost:1234")
        );
    }

    #[test]
    fn test_override_server_and_http() {
        let lookup = lookup_from(&[
            ("SCRIPTRELAY_SERVER__PORT", "9999"),
            ("SCRIPTRELAY_SERVER__HOST", "0.0.0.0"),
            ("SCRIPTRELAY_HTTP__TIMEOUT_SECS", "5"),
        ]);
        let config = apply_overrides(Config::default(), lookup);
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn test_override_ignores_unparseable_numbers() {
        let lookup = lookup_from(&[("SCRIPTRELAY_SERVER__PORT", "not-a-port")]);
        let config = apply_overrides(Config::default(), lookup);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_override_rejects_zero_timeout() {
        for bad in ["0", "-3", "soon"] {
            let lookup = lookup_from(&[("SCRIPTRELAY_HTTP__TIMEOUT_SECS", bad)]);
            let config = apply_overrides(Config::default(), lookup);
            assert_eq!(config.http.timeout_secs, 60);
        }
    }

    #[test]
    fn test_unknown_provider_sections_are_ignored() {
        let file = write_temp_json(r#"{
            "providers": {
                "anthropic": { "apiKey": "sk-ant-elsewhere" },
                "claude": { "apiKey": "sk-ant-current" }
            }
        }"#);

        let config = load_config_from_path(file.path());
        assert_eq!(config.providers.claude.api_key, "sk-ant-current");
        assert!(!config.providers.gemini.is_configured());
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["http"].get("timeoutSecs").is_some());
        assert!(raw["http"].get("timeout_secs").is_none());
    }
}
