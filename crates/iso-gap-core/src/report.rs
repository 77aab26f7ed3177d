use std::{
    fmt::Write,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::analysis::{GapCounts, GapResult};
use crate::catalog::Control;

/// Format styles supported by the default renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Human,
    Markdown,
    Json,
}

impl OutputFormat {
    /// File extension used when a report is written to disk.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Human => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

/// Produce a report string from a `GapResult` using the desired format.
pub fn render_report(result: &GapResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(result),
        OutputFormat::Markdown => render_markdown(result),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport::from(result))?),
    }
}

/// Write one `<stem>.<ext>` file per format into `dir`, returning the paths written.
pub fn write_reports(
    result: &GapResult,
    dir: &Path,
    stem: &str,
    formats: &[OutputFormat],
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;
    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        let mut body = render_report(result, format)?;
        if !body.ends_with('\n') {
            body.push('\n');
        }
        fs::write(&path, body)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn render_human(result: &GapResult) -> anyhow::Result<String> {
    let mut out = String::new();
    if result.gaps.is_empty() {
        writeln!(out, "All ISO 27001 controls are implemented.")?;
    } else {
        writeln!(out, "Controls missing or not met:")?;
        for control in &result.gaps {
            writeln!(out, "- {}: {}", control.id, single_line(&control.title))?;
        }
    }

    let counts = &result.counts;
    writeln!(out)?;
    writeln!(
        out,
        "Implemented {implemented}/{total} controls ({coverage:.1}%), {gaps} gap(s)",
        implemented = counts.implemented,
        total = counts.total,
        coverage = counts.coverage_percent(),
        gaps = counts.gaps,
    )?;

    let warnings = result.warnings();
    if !warnings.is_empty() {
        writeln!(out, "\nWarnings:")?;
        for warning in &warnings {
            writeln!(out, "  - {warning}")?;
        }
    }
    Ok(out)
}

fn render_markdown(result: &GapResult) -> anyhow::Result<String> {
    let mut out = String::new();
    let counts = &result.counts;
    writeln!(out, "# ISO 27001 Gap Report")?;
    writeln!(out)?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "| --- | ---: |")?;
    writeln!(out, "| Total controls | {} |", counts.total)?;
    writeln!(out, "| Implemented | {} |", counts.implemented)?;
    writeln!(out, "| Gaps | {} |", counts.gaps)?;
    writeln!(out, "| Coverage | {:.1}% |", counts.coverage_percent())?;

    writeln!(out, "\n## Gaps\n")?;
    if result.gaps.is_empty() {
        writeln!(out, "All ISO 27001 controls are implemented.")?;
    } else {
        write_control_table(&mut out, &result.gaps)?;
    }

    writeln!(out, "\n## Implemented\n")?;
    if result.implemented.is_empty() {
        writeln!(out, "No controls are marked as implemented.")?;
    } else {
        write_control_table(&mut out, &result.implemented)?;
    }

    let warnings = result.warnings();
    if !warnings.is_empty() {
        writeln!(out, "\n## Warnings\n")?;
        for warning in &warnings {
            writeln!(out, "- {warning}")?;
        }
    }
    Ok(out)
}

fn write_control_table(out: &mut String, controls: &[Control]) -> std::fmt::Result {
    writeln!(out, "| Control | Title |")?;
    writeln!(out, "| --- | --- |")?;
    for control in controls {
        writeln!(
            out,
            "| {} | {} |",
            escape_cell(&control.id),
            escape_cell(&control.title)
        )?;
    }
    Ok(())
}

fn single_line(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}

fn escape_cell(input: &str) -> String {
    single_line(input).replace('|', "\\|")
}

#[derive(Debug, Serialize)]
struct JsonSummary {
    total: usize,
    implemented: usize,
    gaps: usize,
    coverage_percent: f64,
}

impl From<&GapCounts> for JsonSummary {
    fn from(counts: &GapCounts) -> Self {
        Self {
            total: counts.total,
            implemented: counts.implemented,
            gaps: counts.gaps,
            coverage_percent: (counts.coverage_percent() * 10.0).round() / 10.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: JsonSummary,
    implemented: &'a [Control],
    gaps: &'a [Control],
    unknown: &'a [String],
    warnings: Vec<String>,
}

impl<'a> From<&'a GapResult> for JsonReport<'a> {
    fn from(result: &'a GapResult) -> Self {
        Self {
            summary: JsonSummary::from(&result.counts),
            implemented: &result.implemented,
            gaps: &result.gaps,
            unknown: &result.unknown,
            warnings: result.warnings().iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::reconcile;
    use crate::catalog::{ControlCatalog, ImplementationRecord};

    fn sample_result() -> GapResult {
        let catalog = ControlCatalog::new(vec![
            Control::new("A.5.1", "Management direction for information security"),
            Control::new("A.6.1", "Internal organization"),
            Control::new("A.7.1", "Prior to employment"),
        ])
        .unwrap();
        let record =
            ImplementationRecord::from_entries([("A.5.1", true), ("A.6.1", false), ("A.99.9", true)]);
        reconcile(&catalog, &record)
    }

    #[test]
    fn human_report_lists_gaps() {
        let output = render_report(&sample_result(), OutputFormat::Human).unwrap();
        assert!(output.starts_with("Controls missing or not met:\n"));
        assert!(output.contains("- A.6.1: Internal organization"));
        assert!(output.contains("- A.7.1: Prior to employment"));
        assert!(!output.contains("- A.5.1"));
        assert!(output.contains("Implemented 1/3 controls (33.3%), 2 gap(s)"));
        assert!(output.contains("unknown control `A.99.9`"));
    }

    #[test]
    fn human_report_without_gaps() {
        let catalog = ControlCatalog::new(vec![Control::new("A.5.1", "Policies")]).unwrap();
        let record = ImplementationRecord::from_entries([("A.5.1", true)]);
        let output = render_report(&reconcile(&catalog, &record), OutputFormat::Human).unwrap();
        assert!(output.starts_with("All ISO 27001 controls are implemented."));
        assert!(!output.contains("Warnings"));
    }

    #[test]
    fn markdown_report_contains_tables() {
        let output = render_report(&sample_result(), OutputFormat::Markdown).unwrap();
        assert!(output.starts_with("# ISO 27001 Gap Report"));
        assert!(output.contains("| Coverage | 33.3% |"));
        assert!(output.contains("## Gaps"));
        assert!(output.contains("| A.6.1 | Internal organization |"));
        assert!(output.contains("## Implemented"));
        assert!(output.contains("| A.5.1 | Management direction for information security |"));
        assert!(output.contains("## Warnings"));
    }

    #[test]
    fn markdown_escapes_pipes_in_titles() {
        let catalog = ControlCatalog::new(vec![Control::new("A.5.1", "Policies | review")]).unwrap();
        let output = render_report(
            &reconcile(&catalog, &ImplementationRecord::new()),
            OutputFormat::Markdown,
        )
        .unwrap();
        assert!(output.contains("| A.5.1 | Policies \\| review |"));
        assert!(output.contains("No controls are marked as implemented."));
    }

    #[test]
    fn json_report_serializes() {
        let output = render_report(&sample_result(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["total"], serde_json::json!(3));
        assert_eq!(value["summary"]["coverage_percent"], serde_json::json!(33.3));
        assert_eq!(value["gaps"][0]["id"], "A.6.1");
        assert_eq!(value["unknown"], serde_json::json!(["A.99.9"]));
        assert!(value["warnings"].is_array());
    }

    #[test]
    fn writes_one_file_per_format() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("reports");
        let written = write_reports(
            &sample_result(),
            &dir,
            "gap_report",
            &[OutputFormat::Markdown, OutputFormat::Json],
        )
        .unwrap();
        assert_eq!(
            written,
            vec![dir.join("gap_report.md"), dir.join("gap_report.json")]
        );
        let json = fs::read_to_string(dir.join("gap_report.json")).unwrap();
        assert!(json.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["gaps"], serde_json::json!(2));
    }

    #[test]
    fn output_format_names_round_trip_through_serde() {
        let format: OutputFormat = serde_json::from_str("\"markdown\"").unwrap();
        assert_eq!(format, OutputFormat::Markdown);
        assert_eq!(format.extension(), "md");
    }
}
