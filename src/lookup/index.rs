//! Restore index served from a kube reflector cache.

use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use kube::runtime::reflector::Store;
use kube::runtime::{WatchStreamExt, reflector, watcher};
use kube::{Client, ResourceExt};
use tracing::{debug, error, info};

use super::{LookupError, RestoreIndex, RestoreSummary};
use crate::crd::VirtualMachineRestore;
use crate::scoped_api;

/// Restore index backed by an in-memory reflector store.
///
/// The store is fed by `run_restore_reflector`; reads never hit the API server.
/// Listings fail until the initial list has synced, and for namespaces outside
/// the watched scope.
#[derive(Clone)]
pub struct ReflectorRestoreIndex {
    store: Store<VirtualMachineRestore>,
    /// Watched namespace; `None` when watching cluster-wide.
    namespace: Option<String>,
}

impl ReflectorRestoreIndex {
    pub fn new(store: Store<VirtualMachineRestore>, namespace: Option<&str>) -> Self {
        Self {
            store,
            namespace: namespace.map(str::to_string),
        }
    }

    fn ensure_served(&self, namespace: &str) -> Result<(), LookupError> {
        if let Some(watched) = &self.namespace {
            if watched != namespace {
                return Err(LookupError::Backend(format!(
                    "restore cache only watches namespace {:?}, not {:?}",
                    watched, namespace
                )));
            }
        }

        match self.store.wait_until_ready().now_or_never() {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(LookupError::Backend(e.to_string())),
            None => Err(LookupError::Backend("restore cache not synced".to_string())),
        }
    }

    /// Wait until the reflector has completed its initial list.
    pub async fn wait_until_ready(&self) -> Result<(), LookupError> {
        self.store
            .wait_until_ready()
            .await
            .map_err(|e| LookupError::Backend(e.to_string()))
    }
}

#[async_trait]
impl RestoreIndex for ReflectorRestoreIndex {
    async fn list_restores(&self, namespace: &str) -> Result<Vec<RestoreSummary>, LookupError> {
        self.ensure_served(namespace)?;
        let summaries: Vec<RestoreSummary> = self
            .store
            .state()
            .iter()
            .filter(|restore| restore.namespace().as_deref() == Some(namespace))
            .map(|restore| RestoreSummary::from(&**restore))
            .collect();
        debug!(namespace = %namespace, count = summaries.len(), "Listed cached restores");
        Ok(summaries)
    }
}

/// Start watching VirtualMachineRestores and return the index over the cache.
///
/// When `namespace` is `Some(ns)`, only restores in that namespace are cached.
/// The returned future drives the watch and must be polled (usually spawned);
/// it uses the default watcher backoff and only ends if the stream does.
pub fn run_restore_reflector(
    client: Client,
    namespace: Option<&str>,
) -> (ReflectorRestoreIndex, impl std::future::Future<Output = ()> + Send + 'static) {
    let api = scoped_api::<VirtualMachineRestore>(client, namespace);
    let (reader, writer) = reflector::store();
    let scope = namespace.unwrap_or("cluster-wide").to_string();

    // Status changes matter here (status.complete), so no generation predicate.
    let stream = reflector(writer, watcher(api, watcher::Config::default().any_semantic()))
        .default_backoff()
        .touched_objects();

    let driver = async move {
        info!(scope = %scope, "Starting VirtualMachineRestore reflector");
        stream
            .for_each(|event| async move {
                match event {
                    Ok(restore) => debug!(name = %restore.name_any(), "Restore cache updated"),
                    Err(e) => error!(error = %e, "Restore watch error"),
                }
            })
            .await;
        error!("Restore reflector stream ended unexpectedly");
    };

    (ReflectorRestoreIndex::new(reader, namespace), driver)
}
