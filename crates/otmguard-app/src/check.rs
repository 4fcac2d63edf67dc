//! The `check` use case: evaluate a threat model against a rule set and
//! produce a report envelope.

use anyhow::Context;
use camino::Utf8Path;
use otmguard_types::{
    EvaluationResult, OtmguardData, ReportEnvelope, Severity, Summary, ToolMeta, Verdict,
    SCHEMA_REPORT_V1,
};
use time::OffsetDateTime;
use tracing::info;

/// Input for the check use case.
#[derive(Clone, Copy, Debug)]
pub struct CheckInput<'a> {
    /// Path to the OTM document (JSON or YAML).
    pub otm_path: &'a Utf8Path,
    /// Directory of rule YAML files, loaded in lexicographic order.
    pub rules_dir: &'a Utf8Path,
    /// Optional external analyzer risk report (JSON) merged into the result.
    pub external_report: Option<&'a Utf8Path>,
    /// Findings at or above this severity fail the check.
    pub fail_on: Severity,
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    pub report: ReportEnvelope,
}

/// Run the check use case: read the document, load rules, evaluate, merge
/// external findings, and wrap everything in a report envelope.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    let otm = otmguard_otm::load_otm(input.otm_path).context("load OTM document")?;
    let rules = otmguard_rules::load_rules_from_dir(input.rules_dir).context("load rules")?;

    let local = otmguard_domain::evaluate(&otm, &rules);

    let external = match input.external_report {
        None => Vec::new(),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read external report {}", path))?;
            otmguard_analyzers::parse_risk_report_text(&text)
                .with_context(|| format!("parse external report {}", path))?
        }
    };

    let result: EvaluationResult = otmguard_domain::merge(&local, &external);

    info!(
        model = %otm.name,
        rules = rules.len(),
        local_findings = local.findings.len(),
        external_findings = external.len(),
        merged_findings = result.findings.len(),
        "check complete"
    );

    let verdict = compute_verdict(&result.summary, input.fail_on);
    let finished_at = OffsetDateTime::now_utc();

    let report = ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "otmguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at,
        verdict,
        data: OtmguardData {
            model_name: otm.name.clone(),
            components_scanned: otm.components.len() as u32,
            dataflows_scanned: otm.dataflows.len() as u32,
            rules_loaded: rules.len() as u32,
            external_findings: external.len() as u32,
        },
        summary: result.summary,
        findings: result.findings,
    };

    Ok(CheckOutput { report })
}

/// Fail when any finding reaches the threshold; warn when findings exist
/// below it; pass on a clean run.
pub fn compute_verdict(summary: &Summary, fail_on: Severity) -> Verdict {
    let total: u32 = summary.values().sum();
    if total == 0 {
        return Verdict::Pass;
    }
    let failing: u32 = summary
        .iter()
        .filter(|(sev, _)| **sev >= fail_on)
        .map(|(_, count)| count)
        .sum();
    if failing > 0 {
        Verdict::Fail
    } else {
        Verdict::Warn
    }
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Warn => 0,
        Verdict::Fail => 2,
    }
}
