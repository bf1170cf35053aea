//! restore-admission - validating admission webhook for KubeVirt VirtualMachineRestores.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration from the environment
//! - Creates the Kubernetes client and the restore cache
//! - Starts the health server and the TLS webhook server

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tracing::{error, info, warn};

use restore_admission::health::run_health_server;
use restore_admission::lookup::{KubeLookup, Lookups, run_restore_reflector};
use restore_admission::{HealthState, RestoreAdmitter, WebhookConfig, WebhookState, run_webhook_server};

/// Grace period for in-flight admission calls to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restore_admission=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting restore-admission");

    let config = WebhookConfig::from_env()?;
    info!(
        webhook_port = config.webhook_port,
        health_port = config.health_port,
        timeout_secs = config.admission_timeout.as_secs(),
        snapshot_gate = config.feature_gates.is_enabled(restore_admission::config::SNAPSHOT_FEATURE_GATE),
        watch_namespace = config.watch_namespace.as_deref().unwrap_or("cluster-wide"),
        "Loaded configuration"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately so liveness works while the cache syncs
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    // Restore cache backing the conflict scan
    let (restore_index, reflector_driver) =
        run_restore_reflector(client.clone(), config.watch_namespace.as_deref());
    let reflector_handle = tokio::spawn(reflector_driver);

    // Mark ready once the initial restore list has landed in the cache
    {
        let health_state = health_state.clone();
        let restore_index = restore_index.clone();
        tokio::spawn(async move {
            match restore_index.wait_until_ready().await {
                Ok(()) => {
                    info!("Restore cache synced");
                    health_state.set_ready(true).await;
                }
                Err(e) => error!("Restore cache never became ready: {}", e),
            }
        });
    }

    let lookups = Lookups::from_backend(Arc::new(KubeLookup::new(client)))
        .with_restore_index(Arc::new(restore_index));
    let admitter = RestoreAdmitter::new(lookups, Arc::new(config.feature_gates.clone()))
        .with_timeout(config.admission_timeout);
    let webhook_state = Arc::new(WebhookState::new(admitter, Some(health_state.clone())));

    // Start webhook server if certificates are available
    let webhook_handle =
        if Path::new(&config.cert_path).exists() && Path::new(&config.key_path).exists() {
            info!("TLS certificates found, starting webhook server");
            let config = config.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = run_webhook_server(webhook_state, &config).await {
                    error!("Webhook server error: {}", e);
                }
            }))
        } else {
            warn!(
                cert_path = %config.cert_path,
                key_path = %config.key_path,
                "Webhook certificates not found, webhook server disabled"
            );
            None
        };

    // Wait for any task to complete (or fail), or shutdown signal
    tokio::select! {
        result = reflector_handle => {
            if let Err(e) = result {
                error!("Restore reflector task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        result = async {
            match webhook_handle {
                Some(handle) => handle.await,
                None => std::future::pending().await,
            }
        } => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the API server stops routing calls here
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission calls to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("restore-admission stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Signal handler setup failures are fatal; without them there is no graceful shutdown.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
