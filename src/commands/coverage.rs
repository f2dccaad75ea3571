use super::emit;
use super::parse::{results_files, summarize};
use crate::cli::OutputFormat;
use crate::config::TestupConfig;
use crate::coverage::{analyze_file, passed_tests, CoverageReport};
use crate::parser::ParsedReport;
use anyhow::{Context, Result};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CoverageCommand {
    pub list: PathBuf,
    pub run_dir: PathBuf,
    pub format: OutputFormat,
}

pub fn coverage_report(config: &TestupConfig, command: CoverageCommand) -> Result<()> {
    let files = results_files(&command.run_dir)
        .with_context(|| format!("Failed to read run directory {}", command.run_dir.display()))?;
    let (_, reports) = summarize(&files, &config.test_extension)?;
    let passed = passed_tests(reports.iter().flat_map(ParsedReport::outcomes), &config.class_prefix);
    let (report, path) = analyze_file(&command.list, &passed)?;

    let rendered = match command.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
        OutputFormat::Terminal | OutputFormat::Html => render_coverage_terminal(&report, &path),
    };
    emit(&rendered, None)
}

pub fn render_coverage_terminal(report: &CoverageReport, html_path: &Path) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Class", "Covered", "Methods", "Coverage"]);
    for (class, coverage) in &report.classes {
        table.add_row(vec![
            class.clone(),
            coverage.covered.len().to_string(),
            coverage.total().to_string(),
            coverage.percentage().to_string(),
        ]);
    }

    format!(
        "{}\n{}\n{} {} ({} of {} methods)\nReport: {}\n",
        report.title.bold(),
        table,
        "Total:".bold(),
        report.total,
        report.covered_methods,
        report.total_methods,
        html_path.display()
    )
}
