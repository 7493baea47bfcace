//! Key validator: checks a credential with one cheap authenticated call.
//!
//! Pessimistic: only an explicit successful response yields `valid = true`.

use tracing::{info, warn};

use scriptrelay_core::utils::{redact, truncate_string};
use scriptrelay_core::{ErrorKind, ValidationResult};

use crate::provider_set::ProviderSet;
use crate::registry::ProviderKind;

/// Longest provider message echoed back from a failed check.
const MAX_DETAIL_LEN: usize = 200;

#[derive(Clone, Debug)]
pub struct KeyValidator {
    providers: ProviderSet,
}

impl KeyValidator {
    pub fn new(providers: ProviderSet) -> Self {
        Self { providers }
    }

    pub async fn validate(&self, kind: ProviderKind, credential: &str) -> ValidationResult {
        let provider = self.providers.get(kind);
        let name = provider.display_name();

        if credential.trim().is_empty() {
            return ValidationResult::invalid(
                ErrorKind::MissingCredential,
                format!("No {} API key provided.", name),
            );
        }

        match provider.validate(credential).await {
            Ok(()) => {
                info!(provider = name, "Credential accepted");
                ValidationResult::valid(format!("{} credential is valid.", name))
            }
            Err(err) => {
                let kind = err.kind();
                warn!(provider = name, error_type = %kind, "Credential check failed");
                let message = match kind {
                    ErrorKind::Authentication => format!("Invalid {} credential.", name),
                    ErrorKind::Connection | ErrorKind::Timeout => {
                        format!("Could not reach {} to validate the credential.", name)
                    }
                    _ => truncate_string(&redact(&err.to_string(), credential), MAX_DETAIL_LEN),
                };
                ValidationResult::invalid(kind, message)
            }
        }
    }
}
