//! Validation policies for VirtualMachineRestore admission.
//!
//! Policies are grouped by operation:
//! - CREATE: target, source consistency, snapshot state, conflicts (causes accumulate)
//! - UPDATE: immutability only
//!
//! Every policy reports zero or more field-attributed `Cause`s. Infrastructure
//! failures are returned as errors and never turned into causes.

pub mod conflicts;
pub mod immutability;
pub mod patches;
pub mod snapshot;
pub mod source;
pub mod target;

use serde::Serialize;

/// Kind of a validation failure, named after the Kubernetes cause types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CauseType {
    /// A required value is missing or a referenced object does not exist.
    FieldValueNotFound,
    /// A value is present but not acceptable.
    FieldValueInvalid,
}

impl CauseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CauseType::FieldValueNotFound => "FieldValueNotFound",
            CauseType::FieldValueInvalid => "FieldValueInvalid",
        }
    }
}

impl std::fmt::Display for CauseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reason a request was denied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cause {
    pub kind: CauseType,
    pub message: String,
    /// Dotted path of the offending attribute, e.g. `spec.target.apiGroup`.
    pub field: String,
}

impl Cause {
    pub fn not_found(field: &FieldPath, message: impl Into<String>) -> Self {
        Self {
            kind: CauseType::FieldValueNotFound,
            message: message.into(),
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &FieldPath, message: impl Into<String>) -> Self {
        Self {
            kind: CauseType::FieldValueInvalid,
            message: message.into(),
            field: field.to_string(),
        }
    }
}

/// Path to a field of the object under admission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath(Vec<&'static str>);

impl FieldPath {
    pub fn new(root: &'static str) -> Self {
        Self(vec![root])
    }

    pub fn child(&self, name: &'static str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name);
        Self(segments)
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Decision rendered for an admission call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub causes: Vec<Cause>,
}

impl AdmissionDecision {
    pub fn allowed() -> Self {
        Self::default()
    }

    pub fn from_causes(causes: Vec<Cause>) -> Self {
        Self { causes }
    }

    /// Allowed iff no cause was reported.
    pub fn is_allowed(&self) -> bool {
        self.causes.is_empty()
    }

    /// All cause messages, in report order, joined for a summary line.
    pub fn message(&self) -> String {
        self.causes
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
