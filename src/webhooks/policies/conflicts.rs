//! Conflicting restore detection.
//!
//! Flags every restore in the namespace that targets the same object and has
//! not completed. The snapshot name plays no part in the match.
//!
//! This is a point-in-time check: two racing creates can both pass. The
//! restore controller is the authority on concurrent restores.

use super::{Cause, FieldPath};
use crate::crd::TargetReference;
use crate::lookup::{LookupError, RestoreIndex};

/// Scan existing restores for in-progress ones with the same target.
pub async fn scan(
    restores: &dyn RestoreIndex,
    namespace: &str,
    target: &TargetReference,
) -> Result<Vec<Cause>, LookupError> {
    let field = FieldPath::new("spec").child("target");

    let causes = restores
        .list_restores(namespace)
        .await?
        .into_iter()
        .filter(|existing| existing.target == *target && existing.is_in_progress())
        .map(|existing| {
            Cause::invalid(
                &field,
                format!("VirtualMachineRestore {:?} in progress", existing.name),
            )
        })
        .collect();

    Ok(causes)
}
