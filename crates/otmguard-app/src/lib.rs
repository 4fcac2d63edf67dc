//! Use case orchestration for otmguard.
//!
//! This crate provides the application layer: it coordinates the document
//! reader, rule loader, engine, analyzer normalization, and rendering. It
//! is intentionally thin and delegates heavy lifting to those layers.
//!
//! The CLI crate depends on this; it only handles argument parsing, exit
//! codes, and I/O placement.

#![forbid(unsafe_code)]

mod check;
mod render;

pub use check::{compute_verdict, run_check, verdict_exit_code, CheckInput, CheckOutput};
pub use render::{parse_report_json, render_markdown, serialize_report};
