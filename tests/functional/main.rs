// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for VirtualMachineRestore admission.
//!
//! These tests run the real `RestoreAdmitter` (and the axum webhook router)
//! against an in-memory fake cluster. No Kubernetes cluster is required.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_restore_to_missing_vm_allowed
//! ```
//!
//! ## Test Categories
//!
//! - **Create scenarios**: target, source, snapshot and conflict checks
//! - **Update scenarios**: spec immutability
//! - **Abort scenarios**: feature gate, bad requests, faults, timeouts
//! - **Webhook scenarios**: full AdmissionReview round trips over HTTP

// Shared test fixtures
#[path = "../common/mod.rs"]
mod common;

mod fake_cluster;

pub use fake_cluster::*;
