//! restore-admission library crate
//!
//! This module exports the CRD definitions, cluster lookups, and the
//! VirtualMachineRestore validating webhook.

pub mod config;
pub mod crd;
pub mod health;
pub mod lookup;
pub mod webhooks;

pub use config::{ConfigError, FeatureGates, WebhookConfig};
pub use health::HealthState;
pub use webhooks::{
    AdmissionDecision, RestoreAdmitter, WebhookError, WebhookState, run_webhook_server,
};

use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;

/// Create namespaced or cluster-wide API based on scope
pub fn scoped_api<T>(client: Client, namespace: Option<&str>) -> Api<T>
where
    T: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <T as Resource>::DynamicType: Default,
    T: Clone + DeserializeOwned + std::fmt::Debug,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}
