use crate::fingerprint::finding_fingerprint;
use otmguard_types::{EvaluationResult, Finding};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("external finding #{index} is malformed: {source}")]
    InvalidExternal {
        index: usize,
        source: serde_json::Error,
    },
}

/// Combine local findings with externally sourced findings into one
/// result, deduplicating on (entityId, title, severity).
///
/// Local findings are visited first in their existing order, then
/// external findings in input order; the output keeps first-seen order,
/// so merging is idempotent and a no-op for empty external input. The
/// summary is recomputed over the deduplicated set.
pub fn merge(local: &EvaluationResult, external: &[Finding]) -> EvaluationResult {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<Finding> = Vec::new();

    for f in local.findings.iter().chain(external.iter()) {
        let key = finding_fingerprint(&f.entity_id, &f.title, f.severity);
        if seen.insert(key) {
            merged.push(f.clone());
        }
    }

    EvaluationResult::from_findings(merged)
}

/// Normalize raw field mappings (analyzer output that has not been typed
/// yet) into findings. Raw and pre-typed input go through the same serde
/// shape, so both dedup identically in [`merge`].
pub fn normalize_external(values: &[JsonValue]) -> Result<Vec<Finding>, MergeError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value.clone())
                .map_err(|source| MergeError::InvalidExternal { index, source })
        })
        .collect()
}
