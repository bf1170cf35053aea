//! Read-only lookups of the cluster resources a restore admission depends on.
//!
//! Each resource type has its own narrow capability trait so validators only
//! depend on what they read, and tests can fake each one independently.
//!
//! ## Architecture
//!
//! - `client`: `KubeLookup`, live `Api::get_opt` reads through a kube `Client`
//! - `index`: `ReflectorRestoreIndex`, restore listing served from a reflector cache
//!
//! Getters return `Result<Lookup<T>, LookupError>`: `Ok(Lookup::NotFound)` is an
//! ordinary answer, `Err` is a fault that aborts the admission call.

mod client;
mod index;

pub use client::KubeLookup;
pub use index::{ReflectorRestoreIndex, run_restore_reflector};

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::crd::{
    TargetReference, VirtualMachine, VirtualMachineInstance, VirtualMachineRestore,
    VirtualMachineSnapshot, VirtualMachineSnapshotContent,
};

/// Outcome of a successful lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Convert into an `Option`, dropping the distinction to the caller.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

/// A lookup that failed for a reason other than "not found".
#[derive(Error, Debug)]
pub enum LookupError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Backing store could not serve the read
    #[error("lookup backend error: {0}")]
    Backend(String),
}

/// Lightweight view of an existing restore, as served by a `RestoreIndex`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreSummary {
    pub name: String,
    pub target: TargetReference,
    /// `status.complete`; `None` when the status or flag is absent.
    pub complete: Option<bool>,
}

impl RestoreSummary {
    /// Anything short of an explicit `complete: true` counts as in progress.
    pub fn is_in_progress(&self) -> bool {
        self.complete != Some(true)
    }
}

impl From<&VirtualMachineRestore> for RestoreSummary {
    fn from(restore: &VirtualMachineRestore) -> Self {
        Self {
            name: restore.metadata.name.clone().unwrap_or_default(),
            target: restore.spec.target.clone(),
            complete: restore.status.as_ref().and_then(|s| s.complete),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait VirtualMachineGetter: Send + Sync {
    async fn get_virtual_machine(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachine>, LookupError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait VirtualMachineInstanceGetter: Send + Sync {
    async fn get_virtual_machine_instance(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineInstance>, LookupError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotGetter: Send + Sync {
    async fn get_snapshot(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineSnapshot>, LookupError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotContentGetter: Send + Sync {
    async fn get_snapshot_content(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineSnapshotContent>, LookupError>;
}

/// Read port over the restores that exist in a namespace.
///
/// Implementations may list live or serve from a cache; callers only rely on
/// getting a point-in-time view.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RestoreIndex: Send + Sync {
    async fn list_restores(&self, namespace: &str) -> Result<Vec<RestoreSummary>, LookupError>;
}

/// Cluster-wide feature gate query.
#[cfg_attr(test, automock)]
pub trait FeatureGate: Send + Sync {
    /// Whether the Snapshot/Restore feature is enabled.
    fn snapshot_enabled(&self) -> bool;
}

/// The set of lookups a restore admission needs.
#[derive(Clone)]
pub struct Lookups {
    pub virtual_machines: Arc<dyn VirtualMachineGetter>,
    pub instances: Arc<dyn VirtualMachineInstanceGetter>,
    pub snapshots: Arc<dyn SnapshotGetter>,
    pub snapshot_contents: Arc<dyn SnapshotContentGetter>,
    pub restores: Arc<dyn RestoreIndex>,
}

impl Lookups {
    /// Serve every lookup from a single backend.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: VirtualMachineGetter
            + VirtualMachineInstanceGetter
            + SnapshotGetter
            + SnapshotContentGetter
            + RestoreIndex
            + 'static,
    {
        Self {
            virtual_machines: backend.clone(),
            instances: backend.clone(),
            snapshots: backend.clone(),
            snapshot_contents: backend.clone(),
            restores: backend,
        }
    }

    /// Replace the restore index, e.g. with a cache-backed one.
    pub fn with_restore_index(mut self, restores: Arc<dyn RestoreIndex>) -> Self {
        self.restores = restores;
        self
    }
}
