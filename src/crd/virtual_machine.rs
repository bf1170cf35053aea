//! Minimal models of the `kubevirt.io/v1` VirtualMachine and
//! VirtualMachineInstance resources.
//!
//! Only the fields the restore webhook inspects are modelled; everything else
//! is ignored on decode.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of VirtualMachine and VirtualMachineInstance.
pub const CORE_GROUP: &str = "kubevirt.io";

/// Kind name of a VirtualMachine.
pub const VIRTUAL_MACHINE_KIND: &str = "VirtualMachine";

/// VirtualMachine spec (`kubevirt.io/v1`).
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachine",
    plural = "virtualmachines",
    shortname = "vm",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_strategy: Option<String>,

    /// Template for the VirtualMachineInstance started from this VM.
    #[serde(default)]
    pub template: VirtualMachineInstanceTemplateSpec,
}

/// Template wrapper around an instance spec.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceTemplateSpec {
    #[serde(default)]
    pub spec: VirtualMachineInstanceSpec,
}

/// VirtualMachineInstance spec (`kubevirt.io/v1`).
///
/// Also embedded in VirtualMachine templates and in snapshot contents.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachineInstance",
    plural = "virtualmachineinstances",
    shortname = "vmi",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceSpec {
    #[serde(default)]
    pub domain: DomainSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainSpec {
    #[serde(default)]
    pub devices: Devices,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<Firmware>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Devices {
    /// Emulated TPM device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpm: Option<TpmDevice>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TpmDevice {
    /// Keep TPM state across reboots. Requires backend storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Firmware {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootloader: Option<Bootloader>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bootloader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efi: Option<Efi>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Efi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_boot: Option<bool>,

    /// Keep NVRAM state across reboots. Requires backend storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent: Option<bool>,
}

impl VirtualMachineInstanceSpec {
    /// Whether this instance carries a persistent TPM.
    pub fn has_persistent_tpm(&self) -> bool {
        self.domain
            .devices
            .tpm
            .as_ref()
            .and_then(|tpm| tpm.persistent)
            .unwrap_or(false)
    }

    /// Whether this instance carries persistent EFI variables.
    pub fn has_persistent_efi(&self) -> bool {
        self.domain
            .firmware
            .as_ref()
            .and_then(|f| f.bootloader.as_ref())
            .and_then(|b| b.efi.as_ref())
            .and_then(|efi| efi.persistent)
            .unwrap_or(false)
    }

    /// Whether the instance needs a backend-storage volume.
    ///
    /// Backend storage is bound to a single owning VM, so its state cannot be
    /// carried over to a different VM.
    pub fn requires_backend_storage(&self) -> bool {
        self.has_persistent_tpm() || self.has_persistent_efi()
    }
}
