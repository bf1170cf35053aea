//! Immutability validation policy.
//!
//! UPDATE only: a restore's spec cannot change after creation. Status and
//! metadata updates are unaffected.

use super::{Cause, FieldPath};
use crate::crd::VirtualMachineRestoreSpec;

/// Validate that the spec is unchanged between old and new object.
pub fn validate(old: &VirtualMachineRestoreSpec, new: &VirtualMachineRestoreSpec) -> Vec<Cause> {
    if old == new {
        return Vec::new();
    }

    vec![Cause::invalid(
        &FieldPath::new("spec"),
        "spec is immutable after creation",
    )]
}
