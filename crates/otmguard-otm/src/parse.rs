use otmguard_domain::model::Otm;
use std::collections::BTreeSet;
use thiserror::Error;

/// Malformed document input. Fatal at load time: evaluation never runs
/// against a document that failed validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("malformed OTM JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed OTM YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("duplicate {collection} id '{id}'")]
    DuplicateId { collection: &'static str, id: String },
}

/// Parse OTM JSON text into the typed document model.
pub fn parse_otm_json(text: &str) -> Result<Otm, ValidationError> {
    let otm: Otm = serde_json::from_str(text)?;
    validate_otm(&otm)?;
    Ok(otm)
}

/// Parse OTM YAML text into the typed document model.
pub fn parse_otm_yaml(text: &str) -> Result<Otm, ValidationError> {
    let otm: Otm = serde_yaml_ng::from_str(text)?;
    validate_otm(&otm)?;
    Ok(otm)
}

/// Check per-collection id uniqueness. The three id spaces are
/// independent: a component and a dataflow may share an id string.
/// Cross-reference integrity is deliberately not checked.
pub fn validate_otm(otm: &Otm) -> Result<(), ValidationError> {
    check_unique("trust zone", otm.trust_zones.iter().map(|z| z.id.as_str()))?;
    check_unique("component", otm.components.iter().map(|c| c.id.as_str()))?;
    check_unique("dataflow", otm.dataflows.iter().map(|d| d.id.as_str()))?;
    Ok(())
}

fn check_unique<'a>(
    collection: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                collection,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
