//! In-memory fake cluster for functional admission tests.
//!
//! `FakeCluster` implements every lookup trait over plain maps so a real
//! `RestoreAdmitter` can run end-to-end without an API server. Faults and
//! latency can be injected per resource type.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use restore_admission::RestoreAdmitter;
use restore_admission::crd::{
    VirtualMachine, VirtualMachineInstance, VirtualMachineRestore, VirtualMachineSnapshot,
    VirtualMachineSnapshotContent,
};
use restore_admission::lookup::{
    FeatureGate, Lookup, LookupError, Lookups, RestoreIndex, RestoreSummary,
    SnapshotContentGetter, SnapshotGetter, VirtualMachineGetter, VirtualMachineInstanceGetter,
};

use crate::common::fixtures::NAMESPACE;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn object_key(namespace: Option<&String>, name: Option<&String>) -> Key {
    key(
        namespace.map_or(NAMESPACE, String::as_str),
        name.map_or("", String::as_str),
    )
}

/// Resource type a fault can be injected for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    VirtualMachine,
    Instance,
    Snapshot,
    SnapshotContent,
    Restore,
}

#[derive(Default)]
struct State {
    virtual_machines: BTreeMap<Key, VirtualMachine>,
    instances: BTreeMap<Key, VirtualMachineInstance>,
    snapshots: BTreeMap<Key, VirtualMachineSnapshot>,
    snapshot_contents: BTreeMap<Key, VirtualMachineSnapshotContent>,
    restores: BTreeMap<Key, VirtualMachineRestore>,
    faults: BTreeMap<Resource, String>,
}

/// Fake cluster with the Snapshot feature gate enabled by default.
pub struct FakeCluster {
    state: RwLock<State>,
    snapshot_gate: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self {
            state: RwLock::new(State::default()),
            snapshot_gate: AtomicBool::new(true),
            latency: RwLock::new(None),
        }
    }
}

impl FakeCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Admitter wired to this cluster for every lookup and the feature gate.
    pub fn admitter(self: &Arc<Self>) -> RestoreAdmitter {
        RestoreAdmitter::new(Lookups::from_backend(self.clone()), self.clone())
    }

    pub fn add_vm(&self, vm: VirtualMachine) -> &Self {
        let key = object_key(vm.metadata.namespace.as_ref(), vm.metadata.name.as_ref());
        self.state.write().unwrap().virtual_machines.insert(key, vm);
        self
    }

    pub fn add_instance(&self, vmi: VirtualMachineInstance) -> &Self {
        let key = object_key(vmi.metadata.namespace.as_ref(), vmi.metadata.name.as_ref());
        self.state.write().unwrap().instances.insert(key, vmi);
        self
    }

    pub fn add_snapshot(&self, snapshot: VirtualMachineSnapshot) -> &Self {
        let key = object_key(
            snapshot.metadata.namespace.as_ref(),
            snapshot.metadata.name.as_ref(),
        );
        self.state.write().unwrap().snapshots.insert(key, snapshot);
        self
    }

    pub fn add_snapshot_content(&self, content: VirtualMachineSnapshotContent) -> &Self {
        let key = object_key(
            content.metadata.namespace.as_ref(),
            content.metadata.name.as_ref(),
        );
        self.state
            .write()
            .unwrap()
            .snapshot_contents
            .insert(key, content);
        self
    }

    pub fn add_restore(&self, restore: VirtualMachineRestore) -> &Self {
        let key = object_key(
            restore.metadata.namespace.as_ref(),
            restore.metadata.name.as_ref(),
        );
        self.state.write().unwrap().restores.insert(key, restore);
        self
    }

    pub fn set_snapshot_gate(&self, enabled: bool) -> &Self {
        self.snapshot_gate.store(enabled, Ordering::SeqCst);
        self
    }

    /// Make every read of `resource` fail with a backend error.
    pub fn fail(&self, resource: Resource, message: &str) -> &Self {
        self.state
            .write()
            .unwrap()
            .faults
            .insert(resource, message.to_string());
        self
    }

    /// Delay every read by `latency`.
    pub fn slow(&self, latency: Duration) -> &Self {
        *self.latency.write().unwrap() = Some(latency);
        self
    }

    async fn read<T, F>(&self, resource: Resource, read: F) -> Result<T, LookupError>
    where
        F: FnOnce(&State) -> T,
    {
        let latency = *self.latency.read().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.read().unwrap();
        if let Some(message) = state.faults.get(&resource) {
            return Err(LookupError::Backend(message.clone()));
        }
        Ok(read(&state))
    }
}

#[async_trait]
impl VirtualMachineGetter for FakeCluster {
    async fn get_virtual_machine(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachine>, LookupError> {
        self.read(Resource::VirtualMachine, |state| {
            state.virtual_machines.get(&key(namespace, name)).cloned().into()
        })
        .await
    }
}

#[async_trait]
impl VirtualMachineInstanceGetter for FakeCluster {
    async fn get_virtual_machine_instance(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineInstance>, LookupError> {
        self.read(Resource::Instance, |state| {
            state.instances.get(&key(namespace, name)).cloned().into()
        })
        .await
    }
}

#[async_trait]
impl SnapshotGetter for FakeCluster {
    async fn get_snapshot(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineSnapshot>, LookupError> {
        self.read(Resource::Snapshot, |state| {
            state.snapshots.get(&key(namespace, name)).cloned().into()
        })
        .await
    }
}

#[async_trait]
impl SnapshotContentGetter for FakeCluster {
    async fn get_snapshot_content(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineSnapshotContent>, LookupError> {
        self.read(Resource::SnapshotContent, |state| {
            state.snapshot_contents.get(&key(namespace, name)).cloned().into()
        })
        .await
    }
}

#[async_trait]
impl RestoreIndex for FakeCluster {
    async fn list_restores(&self, namespace: &str) -> Result<Vec<RestoreSummary>, LookupError> {
        self.read(Resource::Restore, |state| {
            state
                .restores
                .iter()
                .filter(|((ns, _), _)| ns == namespace)
                .map(|(_, restore)| RestoreSummary::from(restore))
                .collect()
        })
        .await
    }
}

impl FeatureGate for FakeCluster {
    fn snapshot_enabled(&self) -> bool {
        self.snapshot_gate.load(Ordering::SeqCst)
    }
}
