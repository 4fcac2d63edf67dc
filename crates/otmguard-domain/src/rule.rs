use otmguard_types::{EntityKind, Severity};
use serde::{Deserialize, Serialize};

/// Candidate scope a rule evaluates against. Closed set: unknown selectors
/// are rejected when the rule is parsed, not skipped at evaluation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Select {
    Components,
    Dataflows,
    Otm,
}

impl Select {
    /// The entity kind stamped on findings produced under this scope.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Select::Components => EntityKind::Component,
            Select::Dataflows => EntityKind::Dataflow,
            Select::Otm => EntityKind::Otm,
        }
    }
}

/// A declarative policy rule: select a candidate scope, apply a predicate,
/// emit a finding on match.
///
/// `severity` and `select` are closed enums and fail deserialization on
/// unknown values; every other field is a permissive free-form string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: Severity,
    pub select: Select,
    /// Predicate expression; absent means the rule matches every candidate
    /// in its scope.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<String>,
    /// Message template with `{field}` placeholders resolved against the
    /// matched entity.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn default_enabled() -> bool {
    true
}
