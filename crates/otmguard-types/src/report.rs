use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Stable schema identifier for otmguard reports.
pub const SCHEMA_REPORT_V1: &str = "otmguard.report.v1";

/// Five-level severity scale shared with common threat-model taxonomies.
///
/// The ordering is semantic: `Info < Low < Medium < High < Critical`, so
/// threshold policies can use plain comparisons.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// The kind of entity a finding is anchored to, derived from the rule's
/// selector scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Component,
    Dataflow,
    Otm,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Component => "component",
            EntityKind::Dataflow => "dataflow",
            EntityKind::Otm => "otm",
        }
    }
}

/// One emitted match of a rule against a candidate entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub title: String,
    pub severity: Severity,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// The full matched entity, serialized, kept for audit/debugging.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub evidence: JsonValue,
}

/// Per-severity finding counts. Only severities that occur are present.
pub type Summary = BTreeMap<Severity, u32>;

/// The findings sequence plus its derived severity summary.
///
/// `findings` order is significant (rule order, then candidate order for
/// local evaluation; first-seen order after a merge). `summary` is always
/// recomputable from `findings`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationResult {
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub summary: Summary,
}

impl EvaluationResult {
    /// Build a result from a findings sequence, deriving the summary.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let summary = summarize(&findings);
        EvaluationResult { findings, summary }
    }
}

/// Count findings per severity.
pub fn summarize(findings: &[Finding]) -> Summary {
    let mut summary = Summary::new();
    for f in findings {
        *summary.entry(f.severity).or_insert(0) += 1;
    }
    summary
}

/// App-layer pass/warn/fail derived from the summary and a threshold.
/// The engine itself never computes a verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Run statistics carried alongside the result for consumers that do not
/// want to re-derive them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OtmguardData {
    pub model_name: String,
    pub components_scanned: u32,
    pub dataflows_scanned: u32,
    pub rules_loaded: u32,
    pub external_findings: u32,
}

/// Versioned wrapper the CLI writes around an [`EvaluationResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportEnvelope {
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
    pub summary: Summary,
    pub data: OtmguardData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_orders_by_rank() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::Medium.as_str(), "medium");
    }

    #[test]
    fn finding_wire_names_are_camel_case() {
        let f = Finding {
            rule_id: "DF-TLS-001".to_string(),
            title: "Unencrypted cross-zone flow".to_string(),
            severity: Severity::High,
            entity_type: EntityKind::Dataflow,
            entity_id: "f1".to_string(),
            message: "flow f1 unencrypted".to_string(),
            remediation: None,
            tags: Vec::new(),
            evidence: JsonValue::Null,
        };
        let v = serde_json::to_value(&f).expect("serialize finding");
        assert_eq!(
            v,
            json!({
                "ruleId": "DF-TLS-001",
                "title": "Unencrypted cross-zone flow",
                "severity": "high",
                "entityType": "dataflow",
                "entityId": "f1",
                "message": "flow f1 unencrypted",
            })
        );
    }

    #[test]
    fn raw_mapping_deserializes_with_defaults() {
        let raw = json!({
            "ruleId": "ext-1",
            "title": "risk",
            "severity": "medium",
            "entityType": "component",
            "entityId": "b",
            "message": "from analyzer",
        });
        let f: Finding = serde_json::from_value(raw).expect("deserialize finding");
        assert!(f.tags.is_empty());
        assert!(f.remediation.is_none());
        assert!(f.evidence.is_null());
    }

    #[test]
    fn summary_counts_per_severity() {
        let mk = |sev| Finding {
            rule_id: "r".to_string(),
            title: "t".to_string(),
            severity: sev,
            entity_type: EntityKind::Component,
            entity_id: "a".to_string(),
            message: "m".to_string(),
            remediation: None,
            tags: Vec::new(),
            evidence: JsonValue::Null,
        };
        let result = EvaluationResult::from_findings(vec![
            mk(Severity::High),
            mk(Severity::Low),
            mk(Severity::High),
        ]);
        assert_eq!(result.summary.get(&Severity::High), Some(&2));
        assert_eq!(result.summary.get(&Severity::Low), Some(&1));
        assert_eq!(result.summary.get(&Severity::Critical), None);
    }
}
