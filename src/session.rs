//! One complete testing session: discover, execute, parse, analyze
//! coverage and report.

use crate::config::{HandoffConfig, HostTarget, TestupConfig};
use crate::core::TestCategory;
use crate::coverage::{analyze_file, passed_tests};
use crate::discovery::TestWalker;
use crate::errors::{Error, Result};
use crate::handoff::Handoff;
use crate::parser::{element_id, ParsedReport, ResultParser};
use crate::progress::ProgressConfig;
use crate::report::{
    counts_text, CoverageSummary, FileSummary, ResultsPage, ResultsSurface, RunSummary, UiValue,
};
use crate::runner::{
    self, DirectoryStore, Orchestrator, PlannedUnit, ResultsRun, SuiteLoader, UnitRecord,
};
use crossbeam::channel::{never, Receiver};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Element id of the run-wide summary on a live surface.
pub const SUMMARY_ELEMENT: &str = "summary";

/// How results reach the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Per-file property updates as each unit completes
    #[default]
    Live,
    /// One rendered document at the end
    Static,
}

/// Everything a session needs to know, resolved from configuration and
/// command-line overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionPlan {
    pub tests_dir: PathBuf,
    pub results_dir: PathBuf,
    pub extension: String,
    pub intro_file: String,
    pub class_prefix: String,
    pub coverage_list: Option<PathBuf>,
    pub host: HostTarget,
    pub handoff: HandoffConfig,
    /// Glob over category directory names
    pub category_filter: Option<String>,
    /// Glob over unit names
    pub unit_filter: Option<String>,
}

impl SessionPlan {
    pub fn from_config(config: &TestupConfig) -> Self {
        Self {
            tests_dir: config.tests_dir.clone(),
            results_dir: config.results_dir.clone(),
            extension: config.test_extension.clone(),
            intro_file: config.intro_file.clone(),
            class_prefix: config.class_prefix.clone(),
            coverage_list: config.coverage_list.clone(),
            host: config.host,
            handoff: config.handoff.clone(),
            category_filter: None,
            unit_filter: None,
        }
    }

    pub fn discover(&self) -> Result<Vec<TestCategory>> {
        let mut walker = TestWalker::new(self.tests_dir.clone())
            .with_extension(self.extension.clone())
            .with_intro_file(self.intro_file.clone());
        if let Some(pattern) = &self.category_filter {
            walker = walker.with_category_filter(pattern)?;
        }
        if let Some(pattern) = &self.unit_filter {
            walker = walker.with_unit_filter(pattern)?;
        }
        walker.walk()
    }
}

pub struct Session<'a> {
    loader: &'a dyn SuiteLoader,
    surface: Option<&'a mut dyn ResultsSurface>,
    mode: OutputMode,
    progress: ProgressConfig,
    cancel: Receiver<()>,
}

impl<'a> Session<'a> {
    pub fn new(loader: &'a dyn SuiteLoader) -> Self {
        Self {
            loader,
            surface: None,
            mode: OutputMode::default(),
            progress: ProgressConfig { quiet_mode: true },
            cancel: never(),
        }
    }

    pub fn with_surface(mut self, surface: &'a mut dyn ResultsSurface, mode: OutputMode) -> Self {
        self.surface = Some(surface);
        self.mode = mode;
        self
    }

    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    /// Cancels a handoff wait when a message arrives or the sender drops.
    pub fn with_cancel(mut self, cancel: Receiver<()>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(&mut self, plan: &SessionPlan) -> Result<RunSummary> {
        if let Some(list) = &plan.coverage_list {
            if !list.is_file() {
                return Err(Error::config_with_path(
                    format!("coverage reference list not found: {}", list.display()),
                    list,
                ));
            }
        }

        let categories = plan.discover()?;
        let units = runner::plan(&categories);
        log::info!(
            "Discovered {} units in {} categories",
            units.len(),
            categories.len()
        );

        let live = match self.mode {
            OutputMode::Live => self.surface.as_deref_mut(),
            OutputMode::Static => None,
        };
        let mut collector = Collector::new(&plan.extension, live);
        match plan.host {
            HostTarget::Local => {
                let run = ResultsRun::create(&plan.results_dir)?;
                collector.summary.run_dir = Some(run.dir().to_path_buf());
                let mut store = DirectoryStore::new(run);
                Orchestrator::new(self.loader, &mut store)
                    .with_progress(self.progress.create_bar(units.len() as u64))
                    .run(&units, |record| collector.record(record))?;
            }
            HostTarget::Handoff => {
                let run = ResultsRun::create(&plan.results_dir)?;
                collector.summary.run_dir = Some(run.dir().to_path_buf());
                run_by_handoff(plan, &units, run.dir(), &self.cancel, &self.progress)?;
                for unit in &units {
                    collector.parse_from_dir(unit, run.dir());
                }
                Handoff::new(&plan.handoff.dir).consume()?;
            }
        }
        let Collector {
            mut summary,
            reports,
            ..
        } = collector;

        if let Some(list) = &plan.coverage_list {
            let passed = passed_tests(reports.iter().flat_map(ParsedReport::outcomes), &plan.class_prefix);
            let (report, report_path) = analyze_file(list, &passed)?;
            summary.coverage = Some(CoverageSummary {
                total: report.total,
                covered_methods: report.covered_methods,
                total_methods: report.total_methods,
                report_path,
            });
        }

        self.finish(&summary, &reports, &categories)?;
        Ok(summary)
    }

    fn finish(
        &mut self,
        summary: &RunSummary,
        reports: &[ParsedReport],
        categories: &[TestCategory],
    ) -> Result<()> {
        let mode = self.mode;
        let Some(surface) = self.surface.as_deref_mut() else {
            return Ok(());
        };

        match mode {
            OutputMode::Live => {
                let tally = &summary.tally;
                surface.set_property(SUMMARY_ELEMENT, "className", &tally.status_class().into())?;
                surface.set_property(SUMMARY_ELEMENT, "innerHTML", &counts_text(tally).into())?;
                surface.set_property(SUMMARY_ELEMENT, "dataset", &UiValue::from(tally))?;
                if let Some(coverage) = &summary.coverage {
                    surface.set_property("coverage", "textContent", &coverage.total.into())?;
                }
            }
            OutputMode::Static => {
                let intros: BTreeMap<String, String> = categories
                    .iter()
                    .filter_map(|c| c.intro.clone().map(|intro| (c.name.clone(), intro)))
                    .collect();
                let html = ResultsPage {
                    summary,
                    reports,
                    intros: &intros,
                }
                .render();
                surface.replace_document(&html)?;
            }
        }
        Ok(())
    }
}

fn run_by_handoff(
    plan: &SessionPlan,
    units: &[PlannedUnit],
    run_dir: &Path,
    cancel: &Receiver<()>,
    progress: &ProgressConfig,
) -> Result<()> {
    let handoff = Handoff::new(&plan.handoff.dir);
    let paths: Vec<PathBuf> = units.iter().map(|u| u.file.path.clone()).collect();
    handoff.write_manifest(&paths, run_dir)?;

    let spinner = progress.create_spinner("Waiting for test host");
    let waited = handoff.wait_for_completion(
        plan.handoff.poll_interval(),
        plan.handoff.timeout(),
        cancel,
    );
    spinner.finish_and_clear();
    if waited.is_err() {
        // Withdraw the request so a host started later does not run it
        if let Err(e) = handoff.consume() {
            log::warn!("{}", e);
        }
    }
    waited
}

/// Parses units as they finish and keeps the live surface current.
struct Collector<'s, 'a> {
    parser: ResultParser,
    extension: String,
    surface: Option<&'s mut (dyn ResultsSurface + 'a)>,
    summary: RunSummary,
    reports: Vec<ParsedReport>,
}

impl<'s, 'a> Collector<'s, 'a> {
    fn new(extension: &str, surface: Option<&'s mut (dyn ResultsSurface + 'a)>) -> Self {
        Self {
            parser: ResultParser::new(extension),
            extension: extension.to_string(),
            surface,
            summary: RunSummary::default(),
            reports: Vec::new(),
        }
    }

    fn record(&mut self, record: &UnitRecord) {
        let unit_name = &record.file.unit_name;
        if let Some(error) = &record.load_error {
            self.summary.skip(unit_name, error.clone());
            return;
        }
        let Some(captured) = &record.captured else {
            self.summary.skip(unit_name, "no results");
            return;
        };
        match captured.read() {
            Ok(text) => {
                let report = self.parser.parse_output(&text);
                self.add(&record.category, unit_name, &record.results_key, report);
            }
            Err(e) => {
                log::warn!("{}: {}", unit_name, e);
                self.summary.skip(unit_name, e.to_string());
            }
        }
    }

    fn parse_from_dir(&mut self, unit: &PlannedUnit, run_dir: &Path) {
        let unit_name = &unit.file.unit_name;
        match self.parser.parse_unit(run_dir, &unit.results_key) {
            Ok(Some(report)) => self.add(&unit.category, unit_name, &unit.results_key, report),
            Ok(None) => self.summary.skip(unit_name, "no results"),
            Err(e) => {
                log::warn!("{}: {}", unit_name, e);
                self.summary.skip(unit_name, e.to_string());
            }
        }
    }

    fn add(&mut self, category: &str, unit_name: &str, results_key: &str, mut report: ParsedReport) {
        if results_key != unit_name {
            report.element_id = Some(element_id(results_key, &self.extension));
        }
        let fallback = element_id(unit_name, &self.extension);
        let file = self.summary.add_file(category, unit_name, fallback, &report);
        if let Some(surface) = self.surface.as_deref_mut() {
            if let Err(e) = push_file_status(surface, file) {
                log::warn!("Live update for {} failed: {}", unit_name, e);
            }
        }
        self.reports.push(report);
    }
}

fn push_file_status(surface: &mut dyn ResultsSurface, file: &FileSummary) -> Result<()> {
    surface.set_property(&file.element_id, "className", &file.tally.status_class().into())?;
    surface.set_property(&file.element_id, "innerHTML", &counts_text(&file.tally).into())
}
