//! Resource models used by the restore admission webhook.
//!
//! - `VirtualMachineRestore`: the object under admission
//! - `VirtualMachineSnapshot` / `VirtualMachineSnapshotContent`: restore sources
//! - `VirtualMachine` / `VirtualMachineInstance`: restore targets

mod restore;
mod snapshot;
mod virtual_machine;

pub use restore::*;
pub use snapshot::*;
pub use virtual_machine::*;
