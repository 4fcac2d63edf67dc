//! Stable DTOs shared across the otmguard workspace.
//!
//! This crate is intentionally boring:
//! - the severity scale and entity kinds
//! - the finding and evaluation-result shapes consumed by serving layers
//! - the versioned report envelope written by the CLI
//!
//! Field names here are wire-stable: the JSON encoding must preserve them
//! losslessly (`ruleId`, `entityId`, ...), so renames are breaking changes.

#![forbid(unsafe_code)]

pub mod report;

pub use report::{
    summarize, EntityKind, EvaluationResult, Finding, OtmguardData, ReportEnvelope, Severity,
    Summary, ToolMeta, Verdict, SCHEMA_REPORT_V1,
};
