//! Loads the builtin rule pack shipped in `rules/builtin/` and evaluates
//! it against a small document.

use camino::Utf8PathBuf;
use otmguard_domain::evaluate;
use otmguard_domain::model::{Component, Dataflow, Otm, TrustZone};
use otmguard_rules::load_rules_from_dir;

fn builtin_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crate has parent")
        .parent()
        .expect("crates dir has parent (repo root)")
        .join("rules")
        .join("builtin")
}

fn sample_otm() -> Otm {
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
            Component {
                id: "a".to_string(),
                name: "A".to_string(),
                kind: "process".to_string(),
                trust_zone: Some("public".to_string()),
                tags: Vec::new(),
            },
            Component {
                id: "b".to_string(),
                name: "B".to_string(),
                kind: "store".to_string(),
                trust_zone: Some("private".to_string()),
                tags: Vec::new(),
            },
        ],
        dataflows: vec![Dataflow {
            id: "f1".to_string(),
            source: "a".to_string(),
            destination: "b".to_string(),
            protocol: Some("http".to_string()),
        }],
        ..Otm::default()
    }
}

#[test]
fn builtin_pack_loads_in_lexicographic_file_order() {
    let rules = load_rules_from_dir(&builtin_dir()).expect("load builtin rules");
    let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "C-TZ-001",
            "C-PII-001",
            "DF-TLS-001",
            "DF-PROTO-001",
            "OTM-REVIEW-001"
        ]
    );
}

#[test]
fn builtin_pack_flags_the_insecure_flow() {
    let rules = load_rules_from_dir(&builtin_dir()).expect("load builtin rules");
    let result = evaluate(&sample_otm(), &rules);

    assert!(
        result
            .findings
            .iter()
            .any(|f| f.rule_id == "DF-TLS-001" && f.entity_id == "f1")
    );
    // The disabled review reminder must not fire.
    assert!(result.findings.iter().all(|f| f.rule_id != "OTM-REVIEW-001"));
}
