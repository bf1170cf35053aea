//! Restore patch validation policy.
//!
//! Validates:
//! - Every patch entry decodes as one JSON Patch operation or an array of them
//! - Operations only touch `/spec/...`, `/metadata/labels/...` or
//!   `/metadata/annotations/...`; for `move` this covers the source too
//!
//! Paths are compared segment by segment as JSON pointers, so values that
//! contain `,` or `:` cannot confuse the check.

use serde::Deserialize;
use serde_json::Value;

use super::{Cause, FieldPath};

/// Pointer prefixes a restore patch may write under.
const PERMITTED_PREFIXES: &[&[&str]] = &[
    &["metadata", "labels"],
    &["metadata", "annotations"],
    &["spec"],
];

/// One decoded JSON Patch operation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Decode one patch entry into its operations.
pub fn decode(patch: &str) -> Result<Vec<PatchOperation>, String> {
    let document: Value = serde_json::from_str(patch).map_err(|e| e.to_string())?;
    match document {
        Value::Object(_) => {
            let op = serde_json::from_value(document).map_err(|e| e.to_string())?;
            Ok(vec![op])
        }
        Value::Array(_) => serde_json::from_value(document).map_err(|e| e.to_string()),
        other => Err(format!("expected a JSON object or array, got {}", other)),
    }
}

/// Split a JSON pointer into unescaped reference tokens.
///
/// Returns `None` for strings that are not pointers into the document.
fn pointer_segments(path: &str) -> Option<Vec<String>> {
    let rest = path.strip_prefix('/')?;
    Some(
        rest.split('/')
            .map(|token| token.replace("~1", "/").replace("~0", "~"))
            .collect(),
    )
}

/// Whether a patch may write to `path`.
///
/// The path must name something strictly below one of the permitted prefixes.
pub fn is_permitted_path(path: &str) -> bool {
    let Some(segments) = pointer_segments(path) else {
        return false;
    };
    PERMITTED_PREFIXES.iter().any(|prefix| {
        segments.len() > prefix.len()
            && segments
                .iter()
                .zip(prefix.iter())
                .all(|(segment, expected)| segment == expected)
    })
}

/// Validate every operation of every patch; causes accumulate.
pub fn validate(patches: &[String], field: &FieldPath) -> Vec<Cause> {
    let mut causes = Vec::new();

    for patch in patches {
        let operations = match decode(patch) {
            Ok(operations) => operations,
            Err(detail) => {
                causes.push(Cause::invalid(
                    field,
                    format!("patch format is not valid - {}: {}", detail, patch),
                ));
                continue;
            }
        };

        for operation in &operations {
            let removed_from = match operation.op.as_str() {
                "move" => operation.from.as_deref(),
                _ => None,
            };
            for path in operation.path.as_deref().into_iter().chain(removed_from) {
                if !is_permitted_path(path) {
                    causes.push(Cause::invalid(
                        field,
                        format!("patching is valid only for elements under /spec/: {}", path),
                    ));
                }
            }
        }
    }

    causes
}
