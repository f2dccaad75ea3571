use super::run::write_summary;
use crate::cli::OutputFormat;
use crate::config::TestupConfig;
use crate::coverage::{analyze_file, passed_tests};
use crate::discovery::list_entries;
use crate::parser::{element_id, ParsedReport, ResultParser};
use crate::report::{CoverageSummary, RunSummary};
use anyhow::Result;
use std::path::{Path, PathBuf};

const RESULTS_SUFFIX: &str = "_results.txt";

#[derive(Debug, Clone)]
pub struct ParseCommand {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub coverage_list: Option<PathBuf>,
}

pub fn parse_results(config: &TestupConfig, command: ParseCommand) -> Result<bool> {
    let mut files = Vec::new();
    for path in &command.paths {
        files.extend(results_files(path)?);
    }

    let (mut summary, reports) = summarize(&files, &config.test_extension)?;
    if command.format == OutputFormat::Html {
        log::warn!("html output is only available from `run`; using terminal");
    }

    let coverage_list = command.coverage_list.as_ref().or(config.coverage_list.as_ref());
    if let Some(list) = coverage_list {
        let passed = passed_tests(reports.iter().flat_map(ParsedReport::outcomes), &config.class_prefix);
        let (report, report_path) = analyze_file(list, &passed)?;
        summary.coverage = Some(CoverageSummary {
            total: report.total,
            covered_methods: report.covered_methods,
            total_methods: report.total_methods,
            report_path,
        });
    }

    let format = match command.format {
        OutputFormat::Html => OutputFormat::Terminal,
        other => other,
    };
    write_summary(&summary, format, command.output.as_deref())?;
    Ok(summary.all_passed())
}

/// A results file as-is, or every `*_results.txt` directly inside a run
/// directory, sorted by name.
pub fn results_files(path: &Path) -> crate::errors::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    Ok(list_entries(path)?
        .into_iter()
        .filter(|p| p.is_file() && is_results_file(p))
        .collect())
}

fn is_results_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(RESULTS_SUFFIX))
        .unwrap_or(false)
}

pub fn unit_name_of(results_file: &Path) -> String {
    let name = results_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(RESULTS_SUFFIX)
        .map(str::to_string)
        .unwrap_or(name)
}

/// Parse each file; missing files are listed as skipped, not counted.
pub fn summarize(files: &[PathBuf], extension: &str) -> crate::errors::Result<(RunSummary, Vec<ParsedReport>)> {
    let mut parser = ResultParser::new(extension);
    let mut summary = RunSummary::new(None);
    let mut reports = Vec::new();

    for file in files {
        let unit_name = unit_name_of(file);
        match parser.parse_file(file)? {
            Some(report) => {
                let category = file
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                summary.add_file(&category, &unit_name, element_id(&unit_name, extension), &report);
                reports.push(report);
            }
            None => summary.skip(&unit_name, "no results"),
        }
    }
    Ok((summary, reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_results_files_in_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("TC_B_results.txt"), "").unwrap();
        fs::write(dir.path().join("TC_A_results.txt"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = results_files(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| unit_name_of(f)).collect();
        assert_eq!(names, vec!["TC_A", "TC_B"]);
    }

    #[test]
    fn test_summarize_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("TC_Face_results.txt");
        fs::write(&present, "Loaded suite TC_Face\ntest_area(TC_Face): .\n").unwrap();
        let missing = dir.path().join("TC_Gone_results.txt");

        let (summary, reports) = summarize(&[present, missing], "rb").unwrap();
        assert_eq!(summary.files.len(), 1);
        assert_eq!(summary.files[0].element_id, "TC_Face.rb");
        assert_eq!(summary.skipped[0].unit_name, "TC_Gone");
        assert_eq!(summary.tally.total(), 1);
        assert_eq!(reports.len(), 1);
    }
}
