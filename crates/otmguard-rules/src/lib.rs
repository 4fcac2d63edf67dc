//! Rule parsing and loading.
//!
//! String-level parsing is IO-free; [`load_rules_from_dir`] is the only
//! filesystem entry point. Severity and selector validation happen here,
//! at load time; an invalid rule never reaches the engine.

#![forbid(unsafe_code)]

mod loader;

use otmguard_domain::rule::Rule;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub use loader::load_rules_from_dir;

/// Malformed rule input. Fatal at load time.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("malformed rule YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("malformed rule #{index}: {source}")]
    Value {
        index: usize,
        source: serde_json::Error,
    },
}

/// One rule file may hold a single rule object or a list of rule objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Box<Rule>),
    Many(Vec<Rule>),
}

/// Parse rule YAML text: either a single rule mapping or a sequence of
/// rule mappings. Document order is preserved.
pub fn parse_rules_yaml(text: &str) -> Result<Vec<Rule>, ValidationError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: OneOrMany = serde_yaml_ng::from_str(text)?;
    Ok(match parsed {
        OneOrMany::One(rule) => vec![*rule],
        OneOrMany::Many(rules) => rules,
    })
}

/// Validate a batch of raw rule mappings (e.g. request payloads) into
/// typed rules, preserving input order.
pub fn rules_from_values(values: &[JsonValue]) -> Result<Vec<Rule>, ValidationError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value.clone())
                .map_err(|source| ValidationError::Value { index, source })
        })
        .collect()
}
