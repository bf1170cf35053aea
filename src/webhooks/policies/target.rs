//! Restore target validation policy.
//!
//! Validates:
//! - `spec.target` names a `kubevirt.io` VirtualMachine
//! - restore patches (see `patches`)
//! - an existing target VM is stopped
//!
//! A missing target VM is fine: the restore controller creates it.

use tracing::debug;

use super::{Cause, FieldPath, patches};
use crate::crd::{CORE_GROUP, TargetReference, VIRTUAL_MACHINE_KIND, VirtualMachineRestoreSpec};
use crate::lookup::{Lookup, LookupError, VirtualMachineGetter, VirtualMachineInstanceGetter};

/// The kinds of restore target this webhook understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestoreTarget<'a> {
    /// A `kubevirt.io` VirtualMachine with the given name.
    VirtualMachine { name: &'a str },
    /// Anything else, with the cause explaining why.
    Unsupported(Cause),
}

impl<'a> RestoreTarget<'a> {
    /// Classify a target reference; `field` is the path of `spec.target`.
    pub fn classify(target: &'a TargetReference, field: &FieldPath) -> Self {
        let Some(api_group) = target.api_group.as_deref() else {
            return RestoreTarget::Unsupported(Cause::not_found(
                &field.child("apiGroup"),
                "missing apiGroup",
            ));
        };

        if api_group != CORE_GROUP {
            return RestoreTarget::Unsupported(Cause::invalid(
                &field.child("apiGroup"),
                "invalid apiGroup",
            ));
        }

        if target.kind != VIRTUAL_MACHINE_KIND {
            return RestoreTarget::Unsupported(Cause::invalid(
                &field.child("kind"),
                "invalid kind",
            ));
        }

        RestoreTarget::VirtualMachine {
            name: target.name.as_str(),
        }
    }
}

/// What the target lookups found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetResolution {
    /// UID of the target VM; withheld when the VM is running.
    pub uid: Option<String>,
    pub vm_exists: bool,
    pub instance_exists: bool,
}

/// Result of the target policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetOutcome {
    pub causes: Vec<Cause>,
    pub resolution: TargetResolution,
    /// Whether the target classified as a VirtualMachine.
    pub is_virtual_machine: bool,
}

/// Validate the restore target and resolve the target VM.
pub async fn validate(
    virtual_machines: &dyn VirtualMachineGetter,
    instances: &dyn VirtualMachineInstanceGetter,
    namespace: &str,
    spec: &VirtualMachineRestoreSpec,
) -> Result<TargetOutcome, LookupError> {
    let spec_field = FieldPath::new("spec");
    let target_field = spec_field.child("target");

    let name = match RestoreTarget::classify(&spec.target, &target_field) {
        RestoreTarget::VirtualMachine { name } => name,
        RestoreTarget::Unsupported(cause) => {
            debug!(field = %cause.field, message = %cause.message, "Unsupported restore target");
            return Ok(TargetOutcome {
                causes: vec![cause],
                resolution: TargetResolution::default(),
                is_virtual_machine: false,
            });
        }
    };

    let mut causes = patches::validate(&spec.patches, &spec_field.child("patches"));

    let vm = match virtual_machines.get_virtual_machine(namespace, name).await? {
        Lookup::Found(vm) => vm,
        Lookup::NotFound => {
            debug!(namespace = %namespace, name = %name, "Target VM does not exist yet");
            return Ok(TargetOutcome {
                causes,
                resolution: TargetResolution::default(),
                is_virtual_machine: true,
            });
        }
    };

    let resolution = match instances
        .get_virtual_machine_instance(namespace, name)
        .await?
    {
        Lookup::NotFound => TargetResolution {
            uid: vm.metadata.uid.clone(),
            vm_exists: true,
            instance_exists: false,
        },
        Lookup::Found(_) => {
            causes.push(Cause::invalid(
                &target_field,
                format!(
                    "VirtualMachineInstance {:?} exists, VM must be stopped before restore",
                    name
                ),
            ));
            TargetResolution {
                uid: None,
                vm_exists: true,
                instance_exists: true,
            }
        }
    };

    Ok(TargetOutcome {
        causes,
        resolution,
        is_virtual_machine: true,
    })
}
