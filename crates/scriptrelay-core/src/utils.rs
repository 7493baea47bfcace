//! Utility helpers: data-dir paths, truncation, and secret redaction.

use std::path::PathBuf;

/// Placeholder substituted for any credential found in outgoing text.
pub const REDACTED: &str = "[REDACTED]";

/// Get the Scriptrelay data directory (e.g. `~/.scriptrelay/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".scriptrelay")
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Replace every occurrence of `secret` in `text` with [`REDACTED`].
///
/// Empty secrets are ignored (they would match everywhere).
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}

/// Redact `secret` from every string inside a JSON value, keys included.
pub fn redact_json(value: &serde_json::Value, secret: &str) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::String(s) => Value::String(redact(s, secret)),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_json(v, secret)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (redact(k, secret), redact_json(v, secret)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Show only the tail of a credential, for status output.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
