//! Validating admission webhook for VirtualMachineRestore.
//!
//! CREATE runs the full policy set:
//! - target: kind/apiGroup, restore patches, target VM stopped
//! - source: cross-VM restore with backend storage
//! - snapshot: existence, readiness, cross-VM target must not exist
//! - conflicts: other in-progress restores of the same target
//!
//! UPDATE only checks that the spec is unchanged.

pub mod admitter;
mod error;
pub mod policies;
pub mod response;
mod server;

pub use admitter::{AdmissionCall, RestoreAdmitter};
pub use error::{Error, Result};
pub use policies::{AdmissionDecision, Cause, CauseType, FieldPath};
pub use server::{
    RESTORE_VALIDATE_PATH, WebhookError, WebhookState, create_webhook_router, run_webhook_server,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
