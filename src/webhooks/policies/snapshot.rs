//! Snapshot state validation policy.
//!
//! Validates:
//! - The referenced VirtualMachineSnapshot exists
//! - It has not failed and is ready to use
//! - A restore across VMs only targets a VM that does not exist yet

use super::{Cause, FieldPath};
use crate::crd::SnapshotPhase;
use crate::lookup::{Lookup, LookupError, SnapshotGetter};

/// Validate the snapshot a restore reads from.
///
/// `target_uid` and `target_vm_exists` come from the target policy; a withheld
/// UID never counts as a mismatch here.
pub async fn validate(
    snapshots: &dyn SnapshotGetter,
    namespace: &str,
    name: &str,
    target_uid: Option<&str>,
    target_vm_exists: bool,
) -> Result<Vec<Cause>, LookupError> {
    let field = FieldPath::new("spec").child("virtualMachineSnapshotName");

    let snapshot = match snapshots.get_snapshot(namespace, name).await? {
        Lookup::Found(snapshot) => snapshot,
        Lookup::NotFound => {
            return Ok(vec![Cause::not_found(
                &field,
                format!("VirtualMachineSnapshot {:?} does not exist", name),
            )]);
        }
    };

    let mut causes = Vec::new();

    if snapshot.phase() == SnapshotPhase::Failed {
        causes.push(Cause::invalid(
            &field,
            format!("VirtualMachineSnapshot {:?} has failed and is invalid to use", name),
        ));
    }

    if !snapshot.is_ready_to_use() {
        causes.push(Cause::invalid(
            &field,
            format!("VirtualMachineSnapshot {:?} is not ready to use", name),
        ));
    }

    let source_and_target_differ = matches!(
        (target_uid, snapshot.source_uid()),
        (Some(target), Some(source)) if target != source
    );
    if source_and_target_differ && target_vm_exists {
        causes.push(Cause::invalid(
            &field,
            "when snapshot source and restore target VMs are different, target VM must not exist",
        ));
    }

    Ok(causes)
}
