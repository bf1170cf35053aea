//! Source consistency validation policy.
//!
//! Validates:
//! - Restoring onto a VM other than the snapshot's source is refused when the
//!   source VM used backend storage
//!
//! A missing snapshot is reported by the snapshot policy, not here.

use tracing::debug;

use super::{Cause, FieldPath};
use crate::crd::VirtualMachineRestoreSpec;
use crate::lookup::{Lookup, SnapshotContentGetter, SnapshotGetter, VirtualMachineGetter};
use crate::webhooks::{Error, Result};

/// Check that a cross-VM restore is structurally safe.
pub async fn validate(
    snapshots: &dyn SnapshotGetter,
    virtual_machines: &dyn VirtualMachineGetter,
    snapshot_contents: &dyn SnapshotContentGetter,
    namespace: &str,
    spec: &VirtualMachineRestoreSpec,
) -> Result<Vec<Cause>> {
    let snapshot_name = spec.virtual_machine_snapshot_name.as_str();

    let snapshot = match snapshots.get_snapshot(namespace, snapshot_name).await? {
        Lookup::Found(snapshot) => snapshot,
        Lookup::NotFound => return Ok(Vec::new()),
    };

    let target_uid = virtual_machines
        .get_virtual_machine(namespace, &spec.target.name)
        .await?
        .found()
        .and_then(|vm| vm.metadata.uid);

    let different = match (target_uid.as_deref(), snapshot.source_uid()) {
        (None, _) => true,
        (Some(target), Some(source)) => target != source,
        (Some(_), None) => false,
    };
    if !different {
        return Ok(Vec::new());
    }

    let content_name = snapshot
        .content_name()
        .ok_or_else(|| Error::MissingSnapshotContentName(snapshot_name.to_string()))?;

    let content = match snapshot_contents
        .get_snapshot_content(namespace, content_name)
        .await?
    {
        Lookup::Found(content) => content,
        Lookup::NotFound => return Err(Error::SnapshotContentNotFound(content_name.to_string())),
    };

    let source_vm = content
        .spec
        .source
        .virtual_machine
        .as_ref()
        .ok_or_else(|| Error::UnexpectedSnapshotSource(content_name.to_string()))?;

    debug!(
        snapshot = %snapshot_name,
        target = %spec.target.name,
        "Restore target differs from snapshot source"
    );

    if source_vm.spec.template.spec.requires_backend_storage() {
        return Ok(vec![Cause::invalid(
            &FieldPath::new("spec"),
            "Restore to a different VM not supported when using backend storage",
        )]);
    }

    Ok(Vec::new())
}
