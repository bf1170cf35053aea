//! Live lookups through the Kubernetes API.

use async_trait::async_trait;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    Lookup, LookupError, RestoreIndex, RestoreSummary, SnapshotContentGetter, SnapshotGetter,
    VirtualMachineGetter, VirtualMachineInstanceGetter,
};
use crate::crd::{
    VirtualMachine, VirtualMachineInstance, VirtualMachineRestore, VirtualMachineSnapshot,
    VirtualMachineSnapshotContent,
};

/// Lookup gateway backed by a kube `Client`.
///
/// Every call is a single GET/LIST against the API server; nothing is retried.
#[derive(Clone)]
pub struct KubeLookup {
    client: Client,
}

impl KubeLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<Lookup<K>, LookupError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
        K: Clone + DeserializeOwned + std::fmt::Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let found = api.get_opt(name).await?;
        debug!(
            kind = %K::kind(&Default::default()),
            namespace = %namespace,
            name = %name,
            found = found.is_some(),
            "Looked up resource"
        );
        Ok(found.into())
    }
}

#[async_trait]
impl VirtualMachineGetter for KubeLookup {
    async fn get_virtual_machine(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachine>, LookupError> {
        self.get(namespace, name).await
    }
}

#[async_trait]
impl VirtualMachineInstanceGetter for KubeLookup {
    async fn get_virtual_machine_instance(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineInstance>, LookupError> {
        self.get(namespace, name).await
    }
}

#[async_trait]
impl SnapshotGetter for KubeLookup {
    async fn get_snapshot(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineSnapshot>, LookupError> {
        self.get(namespace, name).await
    }
}

#[async_trait]
impl SnapshotContentGetter for KubeLookup {
    async fn get_snapshot_content(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup<VirtualMachineSnapshotContent>, LookupError> {
        self.get(namespace, name).await
    }
}

#[async_trait]
impl RestoreIndex for KubeLookup {
    async fn list_restores(&self, namespace: &str) -> Result<Vec<RestoreSummary>, LookupError> {
        let api: Api<VirtualMachineRestore> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&Default::default()).await?;
        Ok(list.items.iter().map(RestoreSummary::from).collect())
    }
}
