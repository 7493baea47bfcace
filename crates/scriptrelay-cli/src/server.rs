//! `scriptrelay serve`: the HTTP relay.
//!
//! Routes:
//! - `GET  /`                         static acknowledgement
//! - `GET  /ping`                     health check
//! - `POST /generate-script`          [`GenerationRequest`] → [`ResponseEnvelope`]
//! - `POST /validate-key/{provider}`  [`ValidationRequest`] → [`ValidationEnvelope`]
//!
//! Every generation and validation answer is HTTP 200 with an envelope body;
//! clients branch on `success`. That includes a request the server itself
//! gives up on, which comes back as a `timeout` envelope.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::error_handling::HandleErrorLayer;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::signal;
use tower::timeout::error::Elapsed;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use scriptrelay_core::config::{load_config, Config};
use scriptrelay_core::{
    ErrorKind, GenerationRequest, ResponseEnvelope, ValidationEnvelope, ValidationRequest,
    ValidationResult,
};
use scriptrelay_providers::{find_by_name, KeyValidator, ScriptGenerator};

use crate::helpers;

/// Headroom over the upstream timeout, so the provider's own timeout error
/// reaches the client before the server gives up on the request.
const SERVER_TIMEOUT_SLACK_SECS: u64 = 15;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<ScriptGenerator>,
    pub validator: Arc<KeyValidator>,
}

/// Run the relay until Ctrl+C / SIGTERM.
pub async fn run(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(None);
    let (generator, validator) = helpers::build_services(&config)?;

    let state = AppState {
        generator: Arc::new(generator),
        validator: Arc::new(validator),
    };
    let app = router(state, request_timeout(&config));

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address: {}:{}", host, port))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    helpers::print_banner();
    println!("  Listening on http://{}", addr);
    println!();
    info!(%addr, timeout_secs = config.http.timeout_secs, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn request_timeout(config: &Config) -> Duration {
    config.http.timeout() + Duration::from_secs(SERVER_TIMEOUT_SLACK_SECS)
}

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ping", get(ping))
        .route("/generate-script", post(generate_script))
        .route("/validate-key/{provider}", post(validate_key))
        .layer(TraceLayer::new_for_http())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_layer_error))
                .timeout(request_timeout),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// ─────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Scriptrelay is running.",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ping() -> Json<Value> {
    Json(json!({"status": "ok", "message": "Scriptrelay is alive!"}))
}

async fn generate_script(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Json<ResponseEnvelope> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected generate-script body");
            return Json(ResponseEnvelope::failure(
                ErrorKind::InvalidRequest,
                format!("Invalid request body: {}", rejection.body_text()),
            ));
        }
    };

    Json(state.generator.generate(&request).await)
}

async fn validate_key(
    State(state): State<AppState>,
    Path(selector): Path<String>,
    body: Result<Json<ValidationRequest>, JsonRejection>,
) -> Json<ValidationEnvelope> {
    let Some(spec) = find_by_name(&selector) else {
        return Json(
            ValidationResult::invalid(
                ErrorKind::InvalidRequest,
                format!("Unknown provider '{}'. Use 'claude' or 'gemini'.", selector),
            )
            .into(),
        );
    };

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected validate-key body");
            return Json(
                ValidationResult::invalid(
                    ErrorKind::InvalidRequest,
                    format!("Invalid request body: {}", rejection.body_text()),
                )
                .into(),
            );
        }
    };

    let result = state.validator.validate(spec.kind, &request.credential).await;
    Json(result.into())
}

/// Errors from the middleware stack still answer with an envelope.
async fn handle_layer_error(err: BoxError) -> Json<ResponseEnvelope> {
    if err.is::<Elapsed>() {
        warn!("Request exceeded the server timeout");
        return Json(ResponseEnvelope::failure(
            ErrorKind::Timeout,
            "The relay timed out waiting for the provider.",
        ));
    }

    error!(error = %err, "Unhandled middleware error");
    Json(ResponseEnvelope::failure(
        ErrorKind::Unexpected,
        format!("Unexpected server error: {}", err),
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
