use super::emit;
use crate::cli::{OutputFormat, Selection};
use crate::config::{HostTarget, TestupConfig};
use crate::progress::ProgressConfig;
use crate::report::{render_json, render_terminal, HtmlFileSurface, JsonLinesSurface, RunSummary};
use crate::runner::CommandLoader;
use crate::session::{OutputMode, Session, SessionPlan};
use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_PAGE_NAME: &str = "results.html";

#[derive(Debug, Clone)]
pub struct RunCommand {
    pub selection: Selection,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub live: bool,
    pub coverage_list: Option<PathBuf>,
    pub host: Option<HostTarget>,
    pub quiet: bool,
}

/// Build the session plan from configuration plus command-line overrides.
pub fn session_plan(config: &TestupConfig, command: &RunCommand) -> SessionPlan {
    let mut plan = SessionPlan::from_config(config);
    if let Some(dir) = &command.selection.tests_dir {
        plan.tests_dir = dir.clone();
    }
    plan.category_filter = command.selection.category.clone();
    plan.unit_filter = command.selection.filter.clone();
    if let Some(list) = &command.coverage_list {
        plan.coverage_list = Some(list.clone());
    }
    if let Some(host) = command.host {
        plan.host = host;
    }
    plan
}

/// Returns whether every parsed test passed.
pub fn run_tests(config: &TestupConfig, command: RunCommand) -> Result<bool> {
    let plan = session_plan(config, &command);
    let loader = CommandLoader::from_template(&config.runner.command)?;
    let progress = ProgressConfig::from_env(command.quiet);

    let summary = match command.format {
        OutputFormat::Html => {
            if command.live {
                log::warn!("--live is ignored with --format html");
            }
            let page = command
                .output
                .clone()
                .unwrap_or_else(|| plan.results_dir.join(DEFAULT_PAGE_NAME));
            let mut surface = HtmlFileSurface::new(page.clone());
            let summary = Session::new(&loader)
                .with_surface(&mut surface, OutputMode::Static)
                .with_progress(progress)
                .run(&plan)
                .context("Test session failed")?;
            println!("Results page written to {}", page.display());
            summary
        }
        _ if command.live => {
            let stdout = std::io::stdout();
            let mut surface = JsonLinesSurface::new(stdout.lock());
            Session::new(&loader)
                .with_surface(&mut surface, OutputMode::Live)
                .with_progress(progress)
                .run(&plan)
                .context("Test session failed")?
        }
        _ => Session::new(&loader)
            .with_progress(progress)
            .run(&plan)
            .context("Test session failed")?,
    };

    if writes_summary(&command) {
        write_summary(&summary, command.format, command.output.as_deref())?;
    } else {
        log::info!("Live events own stdout; pass --output to also write the summary");
    }
    Ok(summary.all_passed())
}

/// Live events are streamed to stdout, so with `--live` the summary is only
/// written when `--output` sends it elsewhere.
fn writes_summary(command: &RunCommand) -> bool {
    !command.live || command.output.is_some()
}

pub(crate) fn write_summary(
    summary: &RunSummary,
    format: OutputFormat,
    output: Option<&std::path::Path>,
) -> Result<()> {
    match format {
        OutputFormat::Json => emit(&render_json(summary)?, output),
        OutputFormat::Terminal => emit(&render_terminal(summary), output),
        // The page itself is the output
        OutputFormat::Html => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> RunCommand {
        RunCommand {
            selection: Selection::default(),
            format: OutputFormat::Terminal,
            output: None,
            live: false,
            coverage_list: None,
            host: None,
            quiet: true,
        }
    }

    #[test]
    fn test_overrides_apply_over_config() {
        let config = TestupConfig::default();
        let mut cmd = command();
        cmd.selection.tests_dir = Some(PathBuf::from("suite"));
        cmd.selection.category = Some("Face".into());
        cmd.host = Some(HostTarget::Handoff);
        cmd.coverage_list = Some(PathBuf::from("api.txt"));

        let plan = session_plan(&config, &cmd);
        assert_eq!(plan.tests_dir, PathBuf::from("suite"));
        assert_eq!(plan.category_filter.as_deref(), Some("Face"));
        assert_eq!(plan.host, HostTarget::Handoff);
        assert_eq!(plan.coverage_list, Some(PathBuf::from("api.txt")));
    }

    #[test]
    fn test_config_values_kept_without_overrides() {
        let mut config = TestupConfig::default();
        config.coverage_list = Some(PathBuf::from("configured.txt"));
        let plan = session_plan(&config, &command());
        assert_eq!(plan.tests_dir, config.tests_dir);
        assert_eq!(plan.coverage_list, Some(PathBuf::from("configured.txt")));
        assert_eq!(plan.host, HostTarget::Local);
    }

    #[test]
    fn test_live_summary_needs_output_file() {
        let mut cmd = command();
        assert!(writes_summary(&cmd));

        cmd.live = true;
        cmd.format = OutputFormat::Json;
        assert!(!writes_summary(&cmd));

        cmd.output = Some(PathBuf::from("summary.json"));
        assert!(writes_summary(&cmd));
    }
}
