use crate::entity::Entity;
use crate::expr::{EvalContext, Predicate};
use crate::model::{Otm, OtmIndex};
use crate::rule::{Rule, Select};
use crate::template;
use otmguard_types::{EvaluationResult, Finding};
use tracing::{debug, warn};

/// Run every enabled rule over the document and materialize findings.
///
/// Findings accumulate in (rule order, then candidate order); that
/// ordering is part of the output contract. A malformed or failing
/// predicate is treated as non-match (fail-closed); a failing message
/// template skips that single finding and the run continues.
pub fn evaluate(otm: &Otm, rules: &[Rule]) -> EvaluationResult {
    let index = OtmIndex::build(otm);
    let ctx = EvalContext { index: &index };

    let mut findings: Vec<Finding> = Vec::new();

    for rule in rules {
        if !rule.enabled {
            continue;
        }

        // Parse once per rule; a malformed predicate matches nothing.
        let predicate = match rule.where_.as_deref() {
            None => None,
            Some(src) => match Predicate::parse(src) {
                Ok(p) => Some(p),
                Err(err) => {
                    debug!(rule = %rule.id, %err, "predicate failed to parse, rule matches nothing");
                    continue;
                }
            },
        };

        let candidates: Vec<Entity<'_>> = match rule.select {
            Select::Components => otm.components.iter().map(Entity::Component).collect(),
            Select::Dataflows => otm.dataflows.iter().map(Entity::Dataflow).collect(),
            Select::Otm => vec![Entity::Document(otm)],
        };

        for entity in candidates {
            let matched = match &predicate {
                None => true,
                Some(p) => match p.eval(&entity, &ctx) {
                    Ok(value) => value.truthy(),
                    Err(err) => {
                        debug!(
                            rule = %rule.id,
                            entity = %entity.id(),
                            %err,
                            "predicate evaluation failed, treated as non-match"
                        );
                        false
                    }
                },
            };
            if !matched {
                continue;
            }

            let message = match template::expand(&rule.message, &entity) {
                Ok(m) => m,
                Err(err) => {
                    warn!(
                        rule = %rule.id,
                        entity = %entity.id(),
                        %err,
                        "message template failed, finding skipped"
                    );
                    continue;
                }
            };

            findings.push(Finding {
                rule_id: rule.id.clone(),
                title: rule.title.clone(),
                severity: rule.severity,
                entity_type: rule.select.entity_kind(),
                entity_id: entity.id().to_string(),
                message,
                remediation: rule.remediation.clone(),
                tags: rule.tags.clone(),
                evidence: entity.evidence(),
            });
        }
    }

    EvaluationResult::from_findings(findings)
}
