//! Read-only models of VirtualMachineSnapshot and
//! VirtualMachineSnapshotContent (`snapshot.kubevirt.io/v1beta1`).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::virtual_machine::VirtualMachineSpec;

/// VirtualMachineSnapshot captures a point-in-time copy of a VirtualMachine.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "snapshot.kubevirt.io",
    version = "v1beta1",
    kind = "VirtualMachineSnapshot",
    plural = "virtualmachinesnapshots",
    shortname = "vmsnapshot",
    status = "VirtualMachineSnapshotStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSnapshotSpec {
    /// The VirtualMachine this snapshot was taken from.
    #[serde(default)]
    pub source: SnapshotSourceReference,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSourceReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

/// Status of a VirtualMachineSnapshot.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSnapshotStatus {
    #[serde(default)]
    pub phase: SnapshotPhase,

    /// Set once the snapshot content is usable for restores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_to_use: Option<bool>,

    /// UID of the VirtualMachine the snapshot was taken from.
    #[serde(rename = "sourceUID", default, skip_serializing_if = "Option::is_none")]
    pub source_uid: Option<String>,

    /// Name of the VirtualMachineSnapshotContent holding the frozen VM spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_snapshot_content_name: Option<String>,
}

/// SnapshotPhase is the lifecycle phase of a VirtualMachineSnapshot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum SnapshotPhase {
    InProgress,
    Succeeded,
    Failed,
    /// Also used for phases this webhook does not recognize.
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SnapshotPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotPhase::InProgress => write!(f, "InProgress"),
            SnapshotPhase::Succeeded => write!(f, "Succeeded"),
            SnapshotPhase::Failed => write!(f, "Failed"),
            SnapshotPhase::Unknown => write!(f, "Unknown"),
        }
    }
}

impl VirtualMachineSnapshot {
    pub fn phase(&self) -> SnapshotPhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    /// A missing status or readiness flag counts as not ready.
    pub fn is_ready_to_use(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.ready_to_use)
            .unwrap_or(false)
    }

    pub fn source_uid(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.source_uid.as_deref())
    }

    pub fn content_name(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.virtual_machine_snapshot_content_name.as_deref())
    }
}

/// VirtualMachineSnapshotContent holds the VM specification frozen at
/// snapshot time together with its volume backups.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "snapshot.kubevirt.io",
    version = "v1beta1",
    kind = "VirtualMachineSnapshotContent",
    plural = "virtualmachinesnapshotcontents",
    shortname = "vmsnapshotcontent",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSnapshotContentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_snapshot_name: Option<String>,

    #[serde(default)]
    pub source: SnapshotContentSource,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotContentSource {
    /// The source VirtualMachine as it was when the snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine: Option<SnapshotSourceVirtualMachine>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSourceVirtualMachine {
    #[serde(default)]
    pub spec: VirtualMachineSpec,
}
