//! Report serialization and Markdown rendering.

use anyhow::Context;
use otmguard_types::{ReportEnvelope, Severity, Verdict};

pub fn serialize_report(report: &ReportEnvelope) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(report).context("serialize report")?;
    out.push('\n');
    Ok(out)
}

pub fn parse_report_json(text: &str) -> anyhow::Result<ReportEnvelope> {
    serde_json::from_str(text).context("parse report json")
}

pub fn render_markdown(report: &ReportEnvelope) -> String {
    let mut out = String::new();

    out.push_str("# otmguard report\n\n");
    let verdict = match report.verdict {
        Verdict::Pass => "PASS",
        Verdict::Warn => "WARN",
        Verdict::Fail => "FAIL",
    };
    out.push_str(&format!(
        "- Model: **{}**\n- Verdict: **{}**\n- Findings: {}\n",
        report.data.model_name,
        verdict,
        report.findings.len()
    ));

    if !report.summary.is_empty() {
        // Most severe first.
        let parts: Vec<String> = report
            .summary
            .iter()
            .rev()
            .map(|(sev, count)| format!("{} {}", sev.as_str(), count))
            .collect();
        out.push_str(&format!("- Summary: {}\n", parts.join(", ")));
    }
    out.push('\n');

    if report.findings.is_empty() {
        out.push_str("No findings.\n");
        return out;
    }

    out.push_str("## Findings\n\n");

    for f in &report.findings {
        out.push_str(&format!(
            "- [{}] `{}` — {} (`{}` `{}`)\n",
            severity_label(f.severity),
            f.rule_id,
            f.message,
            f.entity_type.as_str(),
            f.entity_id
        ));
        if let Some(remediation) = &f.remediation {
            out.push_str(&format!("  - remediation: {}\n", remediation));
        }
    }

    out
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "INFO",
        Severity::Low => "LOW",
        Severity::Medium => "MEDIUM",
        Severity::High => "HIGH",
        Severity::Critical => "CRITICAL",
    }
}
