use crate::model::{Component, Dataflow, Otm, TrustZone};
use crate::rule::{Rule, Select};
use otmguard_types::{EntityKind, Finding, Severity};
use serde_json::Value as JsonValue;

/// Two zones, two components, one http dataflow between them.
pub fn sample_otm() -> Otm {
    Otm {
        otm_version: "0.1".to_string(),
        name: "sample".to_string(),
        trust_zones: vec![
            TrustZone {
                id: "public".to_string(),
                name: "Public".to_string(),
            },
            TrustZone {
                id: "private".to_string(),
                name: "Private".to_string(),
            },
        ],
        components: vec![
            component("a", "public", &[]),
            Component {
                id: "b".to_string(),
                name: "B".to_string(),
                kind: "store".to_string(),
                trust_zone: Some("private".to_string()),
                tags: vec!["pii".to_string()],
            },
        ],
        dataflows: vec![dataflow("f1", "a", "b", Some("http"))],
        ..Otm::default()
    }
}

pub fn component(id: &str, trust_zone: &str, tags: &[&str]) -> Component {
    Component {
        id: id.to_string(),
        name: id.to_uppercase(),
        kind: "process".to_string(),
        trust_zone: Some(trust_zone.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn dataflow(id: &str, source: &str, destination: &str, protocol: Option<&str>) -> Dataflow {
    Dataflow {
        id: id.to_string(),
        source: source.to_string(),
        destination: destination.to_string(),
        protocol: protocol.map(|p| p.to_string()),
    }
}

pub fn rule(
    id: &str,
    select: Select,
    where_: Option<&str>,
    severity: Severity,
    message: &str,
) -> Rule {
    Rule {
        id: id.to_string(),
        title: format!("rule {id}"),
        description: None,
        severity,
        select,
        where_: where_.map(|w| w.to_string()),
        message: message.to_string(),
        remediation: None,
        tags: Vec::new(),
        enabled: true,
        version: None,
    }
}

pub fn finding(
    rule_id: &str,
    title: &str,
    severity: Severity,
    entity_type: EntityKind,
    entity_id: &str,
    message: &str,
) -> Finding {
    Finding {
        rule_id: rule_id.to_string(),
        title: title.to_string(),
        severity,
        entity_type,
        entity_id: entity_id.to_string(),
        message: message.to_string(),
        remediation: None,
        tags: Vec::new(),
        evidence: JsonValue::Null,
    }
}
