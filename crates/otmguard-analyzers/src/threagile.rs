use otmguard_types::{EntityKind, Finding, Severity};
use serde_json::Value as JsonValue;

/// Parse a Threagile-shaped risk report into findings.
///
/// Expected shape (simplified):
/// `{ "risks": [ {"title": str, "severity": str, "entityId": str, ...} ] }`
///
/// Field fallbacks mirror what real reports contain: `ruleId` falls back
/// to `id`, `entityId` to `technical_asset`, `message` to `description`.
/// The full risk record is kept as the finding's evidence.
pub fn parse_risk_report(report: &JsonValue) -> Vec<Finding> {
    let Some(risks) = report.get("risks").and_then(|r| r.as_array()) else {
        return Vec::new();
    };

    risks
        .iter()
        .map(|risk| Finding {
            rule_id: str_field(risk, &["ruleId", "id"]).unwrap_or_else(|| "threagile".to_string()),
            title: str_field(risk, &["title"]).unwrap_or_else(|| "risk".to_string()),
            severity: severity_field(risk),
            entity_type: entity_kind_field(risk),
            entity_id: str_field(risk, &["entityId", "technical_asset"])
                .unwrap_or_else(|| "unknown".to_string()),
            message: str_field(risk, &["message", "description"]).unwrap_or_default(),
            remediation: str_field(risk, &["remediation"]),
            tags: tags_field(risk),
            evidence: risk.clone(),
        })
        .collect()
}

/// Parse report JSON text; the text must be valid JSON but need not
/// contain any risks.
pub fn parse_risk_report_text(text: &str) -> Result<Vec<Finding>, serde_json::Error> {
    let report: JsonValue = serde_json::from_str(text)?;
    Ok(parse_risk_report(&report))
}

fn str_field(risk: &JsonValue, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let v = risk.get(name)?;
        match v {
            JsonValue::String(s) => Some(s.clone()),
            // Ids occasionally arrive numeric.
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    })
}

/// Unknown or missing severities coerce to medium, the original
/// analyzer's default.
fn severity_field(risk: &JsonValue) -> Severity {
    match risk
        .get("severity")
        .and_then(|s| s.as_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("info") => Severity::Info,
        Some("low") => Severity::Low,
        Some("high") => Severity::High,
        Some("critical") => Severity::Critical,
        _ => Severity::Medium,
    }
}

fn entity_kind_field(risk: &JsonValue) -> EntityKind {
    match risk.get("entityType").and_then(|s| s.as_str()) {
        Some("dataflow") => EntityKind::Dataflow,
        Some("otm") => EntityKind::Otm,
        _ => EntityKind::Component,
    }
}

fn tags_field(risk: &JsonValue) -> Vec<String> {
    risk.get("tags")
        .and_then(|t| t.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}
