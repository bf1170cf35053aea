//! Restore admission dispatcher.
//!
//! Decodes the candidate object, routes by operation, runs the policies and
//! folds their causes into one decision.

use std::sync::Arc;
use std::time::Duration;

use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, Operation};
use tracing::debug;

use super::policies::{AdmissionDecision, conflicts, immutability, snapshot, source, target};
use super::{Error, Result};
use crate::config::DEFAULT_ADMISSION_TIMEOUT_SECS;
use crate::crd::{RESTORE_RESOURCE, SNAPSHOT_GROUP, VirtualMachineRestore};
use crate::lookup::{FeatureGate, Lookups};

/// The parts of an admission request the dispatcher works from.
#[derive(Clone, Debug)]
pub struct AdmissionCall {
    pub operation: Operation,
    /// API group of the requested resource.
    pub group: String,
    /// Plural name of the requested resource.
    pub resource: String,
    pub namespace: Option<String>,
    /// Raw JSON of the candidate object.
    pub object: Option<Vec<u8>>,
    /// Raw JSON of the previous version (UPDATE only).
    pub old_object: Option<Vec<u8>>,
}

impl AdmissionCall {
    /// Extract the call from a kube admission request, re-encoding the objects.
    pub fn from_request(request: &AdmissionRequest<DynamicObject>) -> Result<Self> {
        Ok(Self {
            operation: request.operation.clone(),
            group: request.resource.group.clone(),
            resource: request.resource.resource.clone(),
            namespace: request.namespace.clone(),
            object: request.object.as_ref().map(serde_json::to_vec).transpose()?,
            old_object: request
                .old_object
                .as_ref()
                .map(serde_json::to_vec)
                .transpose()?,
        })
    }
}

/// Metric/log label for an admission operation.
pub fn operation_label(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

/// Validates VirtualMachineRestore admission calls.
///
/// Holds no mutable state; one instance serves concurrent calls.
#[derive(Clone)]
pub struct RestoreAdmitter {
    lookups: Lookups,
    feature_gate: Arc<dyn FeatureGate>,
    timeout: Duration,
}

impl RestoreAdmitter {
    pub fn new(lookups: Lookups, feature_gate: Arc<dyn FeatureGate>) -> Self {
        Self {
            lookups,
            feature_gate,
            timeout: Duration::from_secs(DEFAULT_ADMISSION_TIMEOUT_SECS),
        }
    }

    /// Bound every call, lookups included, by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Decide an admission call.
    ///
    /// `Ok` carries the decision (allowed iff it has no causes); `Err` aborts
    /// the call without a decision.
    pub async fn admit(&self, call: &AdmissionCall) -> Result<AdmissionDecision> {
        tokio::time::timeout(self.timeout, self.dispatch(call))
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }

    async fn dispatch(&self, call: &AdmissionCall) -> Result<AdmissionDecision> {
        if call.group != SNAPSHOT_GROUP || call.resource != RESTORE_RESOURCE {
            return Err(Error::UnexpectedResource {
                group: call.group.clone(),
                resource: call.resource.clone(),
            });
        }

        match call.operation {
            Operation::Create => {
                if !self.feature_gate.snapshot_enabled() {
                    return Err(Error::FeatureGateDisabled);
                }
                let restore = decode(call.object.as_deref(), "object")?;
                let namespace = resolve_namespace(call, &restore)?;
                self.admit_create(&namespace, &restore).await
            }
            Operation::Update => {
                let restore = decode(call.object.as_deref(), "object")?;
                let previous = decode(call.old_object.as_deref(), "oldObject")?;
                Ok(AdmissionDecision::from_causes(immutability::validate(
                    &previous.spec,
                    &restore.spec,
                )))
            }
            ref other => Err(Error::UnexpectedOperation(
                operation_label(other).to_string(),
            )),
        }
    }

    async fn admit_create(
        &self,
        namespace: &str,
        restore: &VirtualMachineRestore,
    ) -> Result<AdmissionDecision> {
        let spec = &restore.spec;
        let lookups = &self.lookups;

        let target = target::validate(
            lookups.virtual_machines.as_ref(),
            lookups.instances.as_ref(),
            namespace,
            spec,
        )
        .await?;
        let mut causes = target.causes;

        if target.is_virtual_machine {
            causes.extend(
                source::validate(
                    lookups.snapshots.as_ref(),
                    lookups.virtual_machines.as_ref(),
                    lookups.snapshot_contents.as_ref(),
                    namespace,
                    spec,
                )
                .await?,
            );
        }

        let snapshot_causes = snapshot::validate(
            lookups.snapshots.as_ref(),
            namespace,
            &spec.virtual_machine_snapshot_name,
            target.resolution.uid.as_deref(),
            target.resolution.vm_exists,
        )
        .await?;

        // Conflicts are reported ahead of snapshot causes.
        causes.extend(conflicts::scan(lookups.restores.as_ref(), namespace, &spec.target).await?);
        causes.extend(snapshot_causes);

        debug!(
            namespace = %namespace,
            target = %spec.target.name,
            snapshot = %spec.virtual_machine_snapshot_name,
            causes = causes.len(),
            "Validated restore create"
        );

        Ok(AdmissionDecision::from_causes(causes))
    }
}

fn decode(raw: Option<&[u8]>, what: &'static str) -> Result<VirtualMachineRestore> {
    let raw = raw.ok_or(Error::MissingObject(what))?;
    Ok(serde_json::from_slice(raw)?)
}

/// The request namespace, falling back to the object's own.
fn resolve_namespace(call: &AdmissionCall, restore: &VirtualMachineRestore) -> Result<String> {
    call.namespace
        .clone()
        .filter(|ns| !ns.is_empty())
        .or_else(|| restore.metadata.namespace.clone())
        .filter(|ns| !ns.is_empty())
        .ok_or(Error::MissingObject("namespace"))
}
