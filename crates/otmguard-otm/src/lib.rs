//! OTM document adapters: read and parse threat-model documents.
//!
//! This crate is allowed to do filesystem IO; the string-level parsers in
//! [`parse`] are IO-free. Structural schema validation is a collaborator
//! concern. Only what the engine itself needs is checked here: required
//! fields, well-typed fields, and per-collection id uniqueness. Dangling
//! references are valid documents and pass untouched.

#![forbid(unsafe_code)]

pub mod parse;

use anyhow::Context;
use camino::Utf8Path;
use otmguard_domain::model::Otm;

pub use parse::{parse_otm_json, parse_otm_yaml, validate_otm, ValidationError};

/// Read an OTM document from disk, choosing the parser by file extension
/// (`.json`, or `.yaml`/`.yml`/`.otm`).
pub fn load_otm(path: &Utf8Path) -> anyhow::Result<Otm> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    let otm = match path.extension() {
        Some("json") => parse_otm_json(&text),
        _ => parse_otm_yaml(&text),
    }
    .with_context(|| format!("parse {}", path))?;
    Ok(otm)
}
