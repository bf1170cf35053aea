//! VirtualMachineRestore Custom Resource Definition.
//!
//! A VirtualMachineRestore is a declarative request to roll a virtual machine
//! back to a previously captured VirtualMachineSnapshot. This webhook only
//! reads these objects; the restore controller owns their lifecycle.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the snapshot/restore resources.
pub const SNAPSHOT_GROUP: &str = "snapshot.kubevirt.io";

/// Plural resource name used in admission requests for restores.
pub const RESTORE_RESOURCE: &str = "virtualmachinerestores";

/// VirtualMachineRestore restores a VirtualMachine from a snapshot.
///
/// Example:
/// ```yaml
/// apiVersion: snapshot.kubevirt.io/v1beta1
/// kind: VirtualMachineRestore
/// metadata:
///   name: restore-vm1
/// spec:
///   target:
///     apiGroup: kubevirt.io
///     kind: VirtualMachine
///     name: vm1
///   virtualMachineSnapshotName: snap1
///   patches:
///     - '{"op": "replace", "path": "/metadata/labels/tier", "value": "restored"}'
/// ```
#[derive(CustomResource, Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "snapshot.kubevirt.io",
    version = "v1beta1",
    kind = "VirtualMachineRestore",
    plural = "virtualmachinerestores",
    shortname = "vmrestore",
    status = "VirtualMachineRestoreStatus",
    namespaced,
    printcolumn = r#"{"name":"TargetKind", "type":"string", "jsonPath":".spec.target.kind"}"#,
    printcolumn = r#"{"name":"TargetName", "type":"string", "jsonPath":".spec.target.name"}"#,
    printcolumn = r#"{"name":"Complete", "type":"boolean", "jsonPath":".status.complete"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineRestoreSpec {
    /// The object the snapshot is restored onto.
    pub target: TargetReference,

    /// Name of the VirtualMachineSnapshot in the same namespace.
    pub virtual_machine_snapshot_name: String,

    /// JSON patches applied to the restored VirtualMachine, one operation
    /// (or array of operations) per entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<String>,

    /// Remaining spec fields (`volumeRestorePolicy`, `targetReadinessPolicy`,
    /// ...), kept so spec comparisons cover the whole object.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Typed reference to the restore target in the restore's namespace.
///
/// Two references are equal when group, kind and name are all equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetReference {
    /// API group of the target. Required, although the schema allows omission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,

    /// Kind of the target.
    pub kind: String,

    /// Name of the target.
    pub name: String,
}

/// Status of a VirtualMachineRestore, written by the restore controller.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineRestoreStatus {
    /// Set once the restore has finished. Absent or false means in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,

    /// Time the restore completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_time: Option<String>,

    /// Conditions reported by the restore controller.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Condition describes the state of a restore at a certain point.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition ("Ready", "Progressing", ...).
    pub r#type: String,
    /// Status of the condition ("True", "False", "Unknown").
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}
