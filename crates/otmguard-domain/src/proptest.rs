//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Evaluation determinism and findings ordering
//! - The summary law (summary is exactly a per-severity count)
//! - Merge dedup semantics (no-op on empty input, idempotence)

use crate::engine::evaluate;
use crate::model::{Component, Dataflow, Otm, TrustZone};
use crate::rule::{Rule, Select};
use crate::merge::merge;
use otmguard_types::{summarize, EntityKind, Finding, Severity};
use proptest::prelude::*;
use serde_json::Value as JsonValue;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Info),
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High),
        Just(Severity::Critical),
    ]
}

fn arb_select() -> impl Strategy<Value = Select> {
    prop_oneof![
        Just(Select::Components),
        Just(Select::Dataflows),
        Just(Select::Otm),
    ]
}

/// Trust-zone references deliberately include ids that do not resolve,
/// since dangling references are valid documents.
fn arb_zone_ref() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("public".to_string())),
        Just(Some("private".to_string())),
        Just(Some("ghost-zone".to_string())),
    ]
}

fn arb_protocol() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("http".to_string())),
        Just(Some("https".to_string())),
        Just(Some("grpc".to_string())),
    ]
}

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(
        prop_oneof![
            Just("pii".to_string()),
            Just("internet".to_string()),
            Just("encrypted".to_string()),
        ],
        0..3,
    )
}

/// Documents get positional ids (`c0`, `f0`, ...) so the per-collection
/// uniqueness invariant holds by construction.
fn arb_otm() -> impl Strategy<Value = Otm> {
    let components = proptest::collection::vec((arb_zone_ref(), arb_tags()), 0..5);
    let dataflows = proptest::collection::vec((0usize..5, 0usize..5, arb_protocol()), 0..5);

    (components, dataflows).prop_map(|(components, dataflows)| Otm {
        otm_version: "0.1".to_string(),
        name: "generated".to_string(),
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
        components: components
            .into_iter()
            .enumerate()
            .map(|(i, (trust_zone, tags))| Component {
                id: format!("c{i}"),
                name: format!("C{i}"),
                kind: "process".to_string(),
                trust_zone,
                tags,
            })
            .collect(),
        dataflows: dataflows
            .into_iter()
            .enumerate()
            .map(|(i, (src, dst, protocol))| Dataflow {
                id: format!("f{i}"),
                source: format!("c{src}"),
                destination: format!("c{dst}"),
                protocol,
            })
            .collect(),
        ..Otm::default()
    })
}

/// A mix of well-formed, helper-calling, and deliberately broken
/// predicates; broken ones must fail closed, never abort.
fn arb_where() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("protocol == 'http'".to_string())),
        Just(Some("protocol != 'https'".to_string())),
        Just(Some("cross_trust_zone()".to_string())),
        Just(Some("has_tag('pii')".to_string())),
        Just(Some("has_tag('pii') && cross_trust_zone()".to_string())),
        Just(Some("protocol == ".to_string())),
        Just(Some("no_such_helper()".to_string())),
    ]
}

/// Rules get positional ids and titles, matching the caller discipline of
/// unique rule ids.
fn arb_rules() -> impl Strategy<Value = Vec<Rule>> {
    proptest::collection::vec(
        (arb_select(), arb_where(), arb_severity(), any::<bool>()),
        0..6,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (select, where_, severity, enabled))| Rule {
                id: format!("R-{i}"),
                title: format!("generated rule {i}"),
                description: None,
                severity,
                select,
                where_,
                message: "entity {id}".to_string(),
                remediation: None,
                tags: Vec::new(),
                enabled,
                version: None,
            })
            .collect()
    })
}

fn arb_finding() -> impl Strategy<Value = Finding> {
    (
        "[a-z]{1,6}",
        "[a-z ]{1,12}",
        arb_severity(),
        prop_oneof![Just(EntityKind::Component), Just(EntityKind::Dataflow)],
        "[a-z][0-9]?",
    )
        .prop_map(|(rule_id, title, severity, entity_type, entity_id)| Finding {
            rule_id,
            title,
            severity,
            entity_type,
            entity_id,
            message: "external".to_string(),
            remediation: None,
            tags: Vec::new(),
            evidence: JsonValue::Null,
        })
}

fn dedup_key(f: &Finding) -> (String, String, Severity) {
    (f.entity_id.clone(), f.title.clone(), f.severity)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn evaluation_is_deterministic(otm in arb_otm(), rules in arb_rules()) {
        let first = evaluate(&otm, &rules);
        let second = evaluate(&otm, &rules);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn summary_is_exactly_a_per_severity_count(otm in arb_otm(), rules in arb_rules()) {
        let result = evaluate(&otm, &rules);
        prop_assert_eq!(&result.summary, &summarize(&result.findings));
        for severity in Severity::ALL {
            let counted = result
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .count() as u32;
            prop_assert_eq!(result.summary.get(&severity).copied().unwrap_or(0), counted);
        }
    }

    #[test]
    fn disabled_rules_contribute_nothing(otm in arb_otm(), rules in arb_rules()) {
        let disabled: Vec<Rule> = rules
            .iter()
            .cloned()
            .map(|mut r| {
                r.enabled = false;
                r
            })
            .collect();
        let result = evaluate(&otm, &disabled);
        prop_assert!(result.findings.is_empty());
        prop_assert!(result.summary.is_empty());
    }

    #[test]
    fn missing_where_matches_every_candidate(
        otm in arb_otm(),
        select in arb_select(),
        severity in arb_severity(),
    ) {
        let rule = Rule {
            id: "R-all".to_string(),
            title: "match all".to_string(),
            description: None,
            severity,
            select,
            where_: None,
            message: "entity {id}".to_string(),
            remediation: None,
            tags: Vec::new(),
            enabled: true,
            version: None,
        };
        let expected = match select {
            Select::Components => otm.components.len(),
            Select::Dataflows => otm.dataflows.len(),
            Select::Otm => 1,
        };
        let result = evaluate(&otm, &[rule]);
        prop_assert_eq!(result.findings.len(), expected);
    }

    #[test]
    fn merge_with_empty_external_is_a_no_op(otm in arb_otm(), rules in arb_rules()) {
        // Rule titles are unique per rule and a rule visits each entity at
        // most once, so local dedup keys are already unique.
        let local = evaluate(&otm, &rules);
        let merged = merge(&local, &[]);
        prop_assert_eq!(merged, local);
    }

    #[test]
    fn merge_is_idempotent(
        otm in arb_otm(),
        rules in arb_rules(),
        external in proptest::collection::vec(arb_finding(), 0..6),
    ) {
        let local = evaluate(&otm, &rules);
        let once = merge(&local, &external);
        let twice = merge(&once, &external);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merged_dedup_keys_are_unique_and_summary_recomputed(
        otm in arb_otm(),
        rules in arb_rules(),
        external in proptest::collection::vec(arb_finding(), 0..6),
    ) {
        let local = evaluate(&otm, &rules);
        let merged = merge(&local, &external);

        let mut keys: Vec<_> = merged.findings.iter().map(dedup_key).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(before, keys.len());

        prop_assert_eq!(&merged.summary, &summarize(&merged.findings));
    }
}
