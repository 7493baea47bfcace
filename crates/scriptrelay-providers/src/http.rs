//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::ProviderError;

/// Build the client used for every call to one provider.
///
/// `timeout` bounds the whole exchange, so a hung upstream cannot pin a
/// handler forever.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Client(e.to_string()))
}

/// Encode a credential as a sensitive header value.
pub(crate) fn credential_header(
    provider: &'static str,
    credential: &str,
) -> Result<HeaderValue, ProviderError> {
    let mut value = HeaderValue::from_str(credential)
        .map_err(|_| ProviderError::InvalidCredential { provider })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Send a prepared request and decode a 2xx JSON body into `R`.
///
/// Non-2xx responses are classified through [`ProviderError::from_status`].
pub(crate) async fn send_json<R: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    is_auth_body: impl Fn(&Value) -> bool,
) -> Result<R, ProviderError> {
    let response = request.send().await.map_err(|e| {
        let err = ProviderError::from_transport(provider, e);
        error!(provider, error_type = %err.kind(), "HTTP request failed");
        err
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = ProviderError::from_status(provider, status, &body, is_auth_body);
        error!(
            provider,
            status = %status,
            error_type = %err.kind(),
            "API error"
        );
        return Err(err);
    }

    debug!(provider, status = %status, "API response received");

    response
        .json::<R>()
        .await
        .map_err(|e| ProviderError::from_transport(provider, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_header_is_sensitive() {
        let value = credential_header("Anthropic", "sk-ant-123").unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "sk-ant-123");
    }

    #[test]
    fn test_credential_header_rejects_newlines() {
        let err = credential_header("Anthropic", "sk-ant\n-123").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCredential { .. }));
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }
}
