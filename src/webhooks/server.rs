//! Admission webhook server.
//!
//! Provides HTTP endpoints for Kubernetes admission webhooks.
//!
//! To enable the webhook:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at `/virtualmachinerestores-validate`
//! 3. Mount the TLS certificate secret to the pod at /etc/webhook/certs/

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use axum_server::tls_rustls::RustlsConfig;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::admitter::{AdmissionCall, RestoreAdmitter, operation_label};
use super::response;
use crate::config::WebhookConfig;
use crate::health::{HealthState, RESULT_ALLOWED, RESULT_DENIED, RESULT_ERROR};

/// Path the restore validator is served on
pub const RESTORE_VALIDATE_PATH: &str = "/virtualmachinerestores-validate";

/// Shared state for webhook handlers
pub struct WebhookState {
    pub admitter: RestoreAdmitter,
    /// Metrics sink; absent in tests that only look at responses
    pub health: Option<Arc<HealthState>>,
}

impl WebhookState {
    pub fn new(admitter: RestoreAdmitter, health: Option<Arc<HealthState>>) -> Self {
        Self { admitter, health }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(RESTORE_VALIDATE_PATH, post(validate_restore))
        .with_state(state)
}

/// VirtualMachineRestore admission webhook handler
async fn validate_restore(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    let started = Instant::now();
    let uid = &request.uid;
    let operation = operation_label(&request.operation);
    debug!(
        uid = %uid,
        operation,
        namespace = ?request.namespace,
        name = %request.name,
        "Processing admission request"
    );

    let outcome = match AdmissionCall::from_request(&request) {
        Ok(call) => state.admitter.admit(&call).await,
        Err(e) => Err(e),
    };

    let base = AdmissionResponse::from(&request);
    let (rendered, result) = match outcome {
        Ok(decision) if decision.is_allowed() => {
            info!(uid = %uid, operation, "Admission request allowed");
            (response::decide(base, &decision), RESULT_ALLOWED)
        }
        Ok(decision) => {
            warn!(
                uid = %uid,
                operation,
                causes = decision.causes.len(),
                message = %decision.message(),
                "Admission request denied"
            );
            if let Some(health) = &state.health {
                for cause in &decision.causes {
                    health.metrics.record_denied_cause(&cause.field);
                }
            }
            (response::decide(base, &decision), RESULT_DENIED)
        }
        Err(e) => {
            error!(uid = %uid, operation, error = %e, "Admission request aborted");
            (response::abort(base, &e), RESULT_ERROR)
        }
    };

    if let Some(health) = &state.health {
        health
            .metrics
            .record_admission(operation, result, started.elapsed().as_secs_f64());
    }

    (StatusCode::OK, Json(rendered.into_review()))
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[source] std::io::Error),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Run the webhook server with TLS
///
/// Binds to `0.0.0.0:{webhook_port}` and serves [`RESTORE_VALIDATE_PATH`].
/// TLS certificate and key are PEM files at the configured paths.
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    config: &WebhookConfig,
) -> Result<(), WebhookError> {
    let app = create_webhook_router(state);

    let tls = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(WebhookError::TlsConfig)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    info!(port = config.webhook_port, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .map_err(WebhookError::Server)?;

    Ok(())
}
