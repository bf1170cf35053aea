// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for restore-admission.
//!
//! Uses proptest to generate random inputs and verify invariants of the patch
//! validator and the conflict scanner.

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::json;

use restore_admission::crd::TargetReference;
use restore_admission::lookup::{LookupError, RestoreIndex, RestoreSummary};
use restore_admission::webhooks::FieldPath;
use restore_admission::webhooks::policies::{conflicts, patches};

/// Strategy for a plain pointer segment (no `/` or `~`).
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,10}"
}

/// Strategy for the segments below a prefix (at least one).
fn tail() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 1..5)
}

/// Strategy for JSON values, including strings full of delimiters.
fn any_value() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(json!(null)),
        any::<bool>().prop_map(|b| json!(b)),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~]{0,20}".prop_map(|s| json!(s)),
        Just(json!("a,b:c /status/x \"quoted\"")),
        Just(json!({"path": "/status/nested", "op": "remove"})),
    ]
}

fn any_op() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("add"),
        Just("remove"),
        Just("replace"),
        Just("test"),
        Just("copy"),
        Just("move"),
    ]
}

fn pointer(segments: &[String]) -> String {
    segments.iter().map(|s| format!("/{}", s)).collect()
}

/// Strategy for a path a restore patch may write to.
fn permitted_path() -> impl Strategy<Value = String> {
    let prefix = prop_oneof![
        Just(vec!["spec".to_string()]),
        Just(vec!["metadata".to_string(), "labels".to_string()]),
        Just(vec!["metadata".to_string(), "annotations".to_string()]),
    ];
    (prefix, tail()).prop_map(|(mut prefix, tail)| {
        prefix.extend(tail);
        pointer(&prefix)
    })
}

/// Strategy for a path outside the permitted prefixes.
fn forbidden_path() -> impl Strategy<Value = String> {
    prop_oneof![
        // Top level other than spec/metadata
        (segment(), prop::collection::vec(segment(), 0..4))
            .prop_filter("not a permitted root", |(root, _)| root != "spec"
                && root != "metadata")
            .prop_map(|(root, rest)| {
                let mut all = vec![root];
                all.extend(rest);
                pointer(&all)
            }),
        // metadata/<anything but labels or annotations>
        (segment(), prop::collection::vec(segment(), 0..3))
            .prop_filter("not labels or annotations", |(second, _)| second != "labels"
                && second != "annotations")
            .prop_map(|(second, rest)| {
                let mut all = vec!["metadata".to_string(), second];
                all.extend(rest);
                pointer(&all)
            }),
        // The prefixes themselves
        Just("/spec".to_string()),
        Just("/metadata/labels".to_string()),
        Just("/metadata/annotations".to_string()),
        Just("".to_string()),
        // Substring lookalikes
        tail().prop_map(|tail| format!("/specification{}", pointer(&tail))),
        tail().prop_map(|tail| format!("/metadata/labelsx{}", pointer(&tail))),
    ]
}

fn operation(op: &str, path: &str, value: &serde_json::Value) -> serde_json::Value {
    json!({"op": op, "path": path, "value": value})
}

fn field() -> FieldPath {
    FieldPath::new("spec").child("patches")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Operations under permitted prefixes never produce causes, whatever the value.
    #[test]
    fn permitted_paths_always_pass(
        ops in prop::collection::vec((any_op(), permitted_path(), any_value()), 1..6),
        as_array in any::<bool>(),
    ) {
        let entries: Vec<String> = if as_array {
            let array: Vec<_> = ops.iter().map(|(op, path, value)| operation(op, path, value)).collect();
            vec![serde_json::to_string(&array).unwrap()]
        } else {
            ops.iter()
                .map(|(op, path, value)| operation(op, path, value).to_string())
                .collect()
        };

        prop_assert!(patches::validate(&entries, &field()).is_empty());
    }

    /// Every forbidden operation yields exactly one cause naming its path.
    #[test]
    fn forbidden_paths_each_denied(
        allowed in prop::collection::vec(permitted_path(), 0..4),
        forbidden in prop::collection::vec(forbidden_path(), 1..4),
    ) {
        let entries: Vec<String> = allowed
            .iter()
            .chain(forbidden.iter())
            .map(|path| operation("remove", path, &json!(null)).to_string())
            .collect();

        let causes = patches::validate(&entries, &field());
        prop_assert_eq!(causes.len(), forbidden.len());
        for (cause, path) in causes.iter().zip(forbidden.iter()) {
            prop_assert_eq!(cause.field.as_str(), "spec.patches");
            prop_assert_eq!(
                &cause.message,
                &format!("patching is valid only for elements under /spec/: {}", path)
            );
        }
    }

    /// Strings that are not JSON objects or arrays are format errors.
    #[test]
    fn non_patch_strings_are_format_errors(garbage in "[a-z :,]{1,30}") {
        let causes = patches::validate(&[garbage], &field());
        prop_assert_eq!(causes.len(), 1);
        prop_assert!(causes[0].message.starts_with("patch format is not valid"));
    }

    /// Escaped segments are compared after unescaping.
    #[test]
    fn escaped_segments_compared_unescaped(tail in tail()) {
        let permitted = format!("/metadata/annotations/example.io~1{}", tail.join("~0"));
        prop_assert!(patches::is_permitted_path(&permitted));

        // "spec~1x" is a single segment "spec/x", not the spec prefix
        let lookalike = format!("/spec~1{}", tail.join("/"));
        prop_assert!(!patches::is_permitted_path(&lookalike));
    }
}

// ============================================================================
// Conflict scanner
// ============================================================================

/// Restore index serving a fixed list.
struct StaticIndex(Vec<RestoreSummary>);

#[async_trait]
impl RestoreIndex for StaticIndex {
    async fn list_restores(&self, _namespace: &str) -> Result<Vec<RestoreSummary>, LookupError> {
        Ok(self.0.clone())
    }
}

fn any_target() -> impl Strategy<Value = TargetReference> {
    (
        prop_oneof![
            Just(None),
            Just(Some("kubevirt.io".to_string())),
            Just(Some("example.io".to_string()))
        ],
        prop_oneof![Just("VirtualMachine".to_string()), Just("Pod".to_string())],
        prop_oneof![Just("vm1".to_string()), Just("vm2".to_string())],
    )
        .prop_map(|(api_group, kind, name)| TargetReference {
            api_group,
            kind,
            name,
        })
}

fn any_summaries() -> impl Strategy<Value = Vec<RestoreSummary>> {
    prop::collection::vec(
        (
            any_target(),
            prop_oneof![Just(None), Just(Some(false)), Just(Some(true))],
        ),
        0..8,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (target, complete))| RestoreSummary {
                name: format!("restore-{}", i),
                target,
                complete,
            })
            .collect()
    })
}

fn scan(index: &StaticIndex, target: &TargetReference) -> Vec<restore_admission::webhooks::Cause> {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(conflicts::scan(index, "default", target))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Exactly the incomplete restores with a value-equal target conflict, in index order.
    #[test]
    fn conflicts_are_incomplete_equal_targets(
        summaries in any_summaries(),
        target in any_target(),
    ) {
        let expected: Vec<String> = summaries
            .iter()
            .filter(|s| s.target == target && s.complete != Some(true))
            .map(|s| format!("VirtualMachineRestore {:?} in progress", s.name))
            .collect();

        let causes = scan(&StaticIndex(summaries), &target);
        let messages: Vec<String> = causes.iter().map(|c| c.message.clone()).collect();
        prop_assert_eq!(messages, expected);
        prop_assert!(causes.iter().all(|c| c.field == "spec.target"));
    }

    /// Marking every restore complete clears all conflicts.
    #[test]
    fn completed_restores_never_conflict(
        summaries in any_summaries(),
        target in any_target(),
    ) {
        let completed = summaries
            .into_iter()
            .map(|s| RestoreSummary { complete: Some(true), ..s })
            .collect();

        prop_assert!(scan(&StaticIndex(completed), &target).is_empty());
    }
}
