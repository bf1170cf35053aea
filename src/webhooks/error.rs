//! Errors that abort an admission call without rendering a decision.
//!
//! Anything that is a property of the submitted object is a `Cause`; these
//! errors cover malformed requests and infrastructure faults.

use thiserror::Error;

use crate::lookup::LookupError;

/// Error type for restore admission
#[derive(Error, Debug)]
pub enum Error {
    /// The request is for a resource this webhook does not handle
    #[error("unexpected resource {group}/{resource}")]
    UnexpectedResource { group: String, resource: String },

    /// The Snapshot/Restore feature gate is disabled
    #[error("Snapshot/Restore feature gate not enabled")]
    FeatureGateDisabled,

    /// Operation other than CREATE or UPDATE
    #[error("unexpected operation {0}")]
    UnexpectedOperation(String),

    /// Object (or old object on UPDATE) missing from the request
    #[error("missing {0} in admission request")]
    MissingObject(&'static str),

    /// Object could not be decoded
    #[error("failed to decode VirtualMachineRestore: {0}")]
    Decode(#[from] serde_json::Error),

    /// Lookup fault
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Snapshot status does not name its content
    #[error("snapshot content name is nil in VirtualMachineSnapshot {0:?} status")]
    MissingSnapshotContentName(String),

    /// Snapshot names a content object that does not exist
    #[error("VirtualMachineSnapshotContent {0:?} not found")]
    SnapshotContentNotFound(String),

    /// Snapshot content does not hold a VirtualMachine source
    #[error("unexpected snapshot source in VirtualMachineSnapshotContent {0:?}")]
    UnexpectedSnapshotSource(String),

    /// Admission call exceeded its deadline
    #[error("admission call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Result type alias for restore admission
pub type Result<T> = std::result::Result<T, Error>;
