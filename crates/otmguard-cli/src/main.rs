//! CLI entry point for otmguard.
//!
//! This module is intentionally thin: it handles argument parsing, I/O,
//! and exit codes. All business logic lives in the `otmguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use otmguard_app::{
    parse_report_json, render_markdown, run_check, serialize_report, verdict_exit_code, CheckInput,
};
use otmguard_types::Severity;

#[derive(Parser, Debug)]
#[command(
    name = "otmguard",
    version,
    about = "Threat-model policy guard for OTM documents"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate rules against an OTM document and write a report.
    Check {
        /// Path to the OTM document (JSON or YAML).
        #[arg(long)]
        otm: Utf8PathBuf,

        /// Directory of rule YAML files (loaded in lexicographic order).
        #[arg(long, default_value = "rules/builtin")]
        rules: Utf8PathBuf,

        /// External analyzer risk report (JSON) to merge into the result.
        #[arg(long)]
        external: Option<Utf8PathBuf>,

        /// Fail the check when a finding reaches this severity
        /// (info|low|medium|high|critical).
        #[arg(long, default_value = "high")]
        fail_on: String,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/otmguard/report.json")]
        report_out: Utf8PathBuf,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = "artifacts/otmguard/comment.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/otmguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Check {
            otm,
            rules,
            external,
            fail_on,
            report_out,
            write_markdown,
            markdown_out,
        } => cmd_check(
            otm,
            rules,
            external,
            &fail_on,
            report_out,
            write_markdown,
            markdown_out,
        ),
        Commands::Md { report, output } => cmd_md(report, output),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Keep stdout for report payloads.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[allow(clippy::too_many_arguments)]
fn cmd_check(
    otm: Utf8PathBuf,
    rules: Utf8PathBuf,
    external: Option<Utf8PathBuf>,
    fail_on: &str,
    report_out: Utf8PathBuf,
    write_markdown: bool,
    markdown_out: Utf8PathBuf,
) -> anyhow::Result<()> {
    let fail_on = parse_severity(fail_on)?;

    let result = (|| -> anyhow::Result<i32> {
        let input = CheckInput {
            otm_path: &otm,
            rules_dir: &rules,
            external_report: external.as_deref(),
            fail_on,
        };
        let output = run_check(input)?;

        write_text_file(&report_out, &serialize_report(&output.report)?)
            .context("write report json")?;

        if write_markdown {
            let md = render_markdown(&output.report);
            write_text_file(&markdown_out, &md).context("write markdown")?;
        }

        Ok(verdict_exit_code(output.report.verdict))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("otmguard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_md(report_path: Utf8PathBuf, output: Option<Utf8PathBuf>) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(&report_path)
        .with_context(|| format!("read report: {}", report_path))?;
    let report = parse_report_json(&report_text)?;
    let md = render_markdown(&report);

    if let Some(out_path) = output {
        write_text_file(&out_path, &md).context("write markdown output")?;
    } else {
        print!("{}", md);
    }

    Ok(())
}

fn parse_severity(v: &str) -> anyhow::Result<Severity> {
    match v {
        "info" => Ok(Severity::Info),
        "low" => Ok(Severity::Low),
        "medium" => Ok(Severity::Medium),
        "high" => Ok(Severity::High),
        "critical" => Ok(Severity::Critical),
        other => anyhow::bail!("unknown severity: {other} (expected info|low|medium|high|critical)"),
    }
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, text).with_context(|| format!("write: {}", path))?;
    Ok(())
}
