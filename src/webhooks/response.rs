//! Rendering admission outcomes as kube `AdmissionResponse`s.

use kube::core::admission::AdmissionResponse;
use kube::core::response::{StatusCause, StatusDetails};

use super::Error;
use super::policies::AdmissionDecision;

/// HTTP status code carried by a denial with causes.
pub const DENIAL_CODE: u16 = 422;
/// Status reason carried by a denial with causes.
pub const DENIAL_REASON: &str = "Invalid";
/// HTTP status code carried by an aborted call.
pub const ABORT_CODE: u16 = 400;

/// Fill `response` (built from the request) with a decision.
pub fn decide(response: AdmissionResponse, decision: &AdmissionDecision) -> AdmissionResponse {
    if decision.is_allowed() {
        return response;
    }

    let mut response = response.deny(decision.message());
    response.result.code = DENIAL_CODE;
    response.result.reason = DENIAL_REASON.to_string();
    response.result.details = Some(StatusDetails {
        name: String::new(),
        group: String::new(),
        kind: String::new(),
        uid: String::new(),
        causes: decision
            .causes
            .iter()
            .map(|cause| StatusCause {
                reason: cause.kind.to_string(),
                message: cause.message.clone(),
                field: cause.field.clone(),
            })
            .collect(),
        retry_after_seconds: 0,
    });
    response
}

/// Fill `response` with an aborted call: denied, no causes.
pub fn abort(response: AdmissionResponse, error: &Error) -> AdmissionResponse {
    let mut response = response.deny(error.to_string());
    response.result.code = ABORT_CODE;
    response
}
