//! Runtime configuration for the restore admission webhook.
//!
//! All settings come from environment variables (set on the Deployment) and
//! fall back to defaults that match the shipped manifests.

use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;

use crate::lookup::FeatureGate;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;
/// Default health/metrics server port
pub const HEALTH_PORT: u16 = 8080;
/// Below the API server's webhook timeout (10s default and maximum).
pub const DEFAULT_ADMISSION_TIMEOUT_SECS: u64 = 8;

/// Name of the feature gate guarding snapshots and restores.
pub const SNAPSHOT_FEATURE_GATE: &str = "Snapshot";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Set of enabled feature gates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureGates {
    enabled: BTreeSet<String>,
}

impl FeatureGates {
    /// Parse a comma separated list such as `Snapshot,HotplugVolumes`.
    pub fn parse(list: &str) -> Self {
        let enabled = list
            .split(',')
            .map(str::trim)
            .filter(|gate| !gate.is_empty())
            .map(str::to_string)
            .collect();
        Self { enabled }
    }

    pub fn is_enabled(&self, gate: &str) -> bool {
        self.enabled.contains(gate)
    }
}

impl FeatureGate for FeatureGates {
    fn snapshot_enabled(&self) -> bool {
        self.is_enabled(SNAPSHOT_FEATURE_GATE)
    }
}

/// Webhook runtime configuration.
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub cert_path: String,
    pub key_path: String,
    pub webhook_port: u16,
    pub health_port: u16,
    /// Upper bound for one admission call, lookups included.
    pub admission_timeout: Duration,
    pub feature_gates: FeatureGates,
    /// Restrict the restore cache to one namespace; `None` watches all.
    pub watch_namespace: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            cert_path: WEBHOOK_CERT_PATH.to_string(),
            key_path: WEBHOOK_KEY_PATH.to_string(),
            webhook_port: WEBHOOK_PORT,
            health_port: HEALTH_PORT,
            admission_timeout: Duration::from_secs(DEFAULT_ADMISSION_TIMEOUT_SECS),
            feature_gates: FeatureGates::default(),
            watch_namespace: None,
        }
    }
}

impl WebhookConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let admission_timeout = match non_empty("ADMISSION_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_number("ADMISSION_TIMEOUT_SECS", &value)?),
            None => defaults.admission_timeout,
        };

        Ok(Self {
            cert_path: non_empty("WEBHOOK_CERT_PATH").unwrap_or(defaults.cert_path),
            key_path: non_empty("WEBHOOK_KEY_PATH").unwrap_or(defaults.key_path),
            webhook_port: match non_empty("WEBHOOK_PORT") {
                Some(value) => parse_number("WEBHOOK_PORT", &value)?,
                None => defaults.webhook_port,
            },
            health_port: match non_empty("HEALTH_PORT") {
                Some(value) => parse_number("HEALTH_PORT", &value)?,
                None => defaults.health_port,
            },
            admission_timeout,
            feature_gates: non_empty("FEATURE_GATES")
                .map(|list| FeatureGates::parse(&list))
                .unwrap_or_default(),
            watch_namespace: non_empty("WATCH_NAMESPACE"),
        })
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}
