//! Sequential test execution.
//!
//! Units run one after another, and cases inside a unit run in declaration
//! order: tests may share mutable external state, so nothing here is ever
//! parallel. Each case is isolated from the others. An `Err` or a panic in
//! setup, body or teardown is written into the transcript as a failure and
//! the batch moves on. A unit that cannot be loaded contributes nothing but
//! does not stop the batch either.
//!
//! - [`case`] - the `TestCase` / `SuiteLoader` seams
//! - [`command`] - loader that drives an external interpreter
//! - [`store`] - results directories and in-memory buffers
//! - [`transcript`] - the verbose line format the parser reads back

pub mod case;
pub mod command;
pub mod store;
pub mod transcript;

pub use case::{
    CaseFailure, CaseResult, FailureKind, FnCase, RegistryLoader, SuiteLoader, TestCase, TestUnit,
};
pub use command::CommandLoader;
pub use store::{CapturedResults, DirectoryStore, MemoryStore, ResultsRun, ResultsStore, UnitSink};

use crate::core::{TestCategory, TestFile, TestId, TestRunResult, TestStatus};
use crate::errors::Result;
use indicatif::ProgressBar;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// A test file queued for execution, with the category it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedUnit {
    pub category: String,
    pub file: TestFile,
    /// Name the results file is written under: the unit name, or
    /// `<category>_<unit>` when the unit name occurs in more than one category
    pub results_key: String,
}

/// Flatten categories into execution order: directory order, then file order.
pub fn plan(categories: &[TestCategory]) -> Vec<PlannedUnit> {
    keyed(
        categories
            .iter()
            .flat_map(|category| {
                category
                    .files
                    .iter()
                    .map(|file| (category.name.clone(), file.clone()))
            })
            .collect(),
    )
}

/// Plan from bare paths (e.g. a handoff manifest); the category is the
/// parent directory name.
pub fn plan_paths(paths: &[PathBuf]) -> Vec<PlannedUnit> {
    keyed(
        paths
            .iter()
            .map(|path| {
                let category = path
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (category, TestFile::new(path.clone()))
            })
            .collect(),
    )
}

fn keyed(entries: Vec<(String, TestFile)>) -> Vec<PlannedUnit> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (_, file) in &entries {
        *seen.entry(file.unit_name.as_str()).or_default() += 1;
    }
    let repeated: HashSet<String> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect();

    entries
        .into_iter()
        .map(|(category, file)| {
            let results_key = if repeated.contains(&file.unit_name) {
                format!("{}_{}", category, file.unit_name)
            } else {
                file.unit_name.clone()
            };
            PlannedUnit {
                category,
                file,
                results_key,
            }
        })
        .collect()
}

/// What one unit produced.
#[derive(Clone, Debug)]
pub struct UnitRecord {
    pub category: String,
    pub file: TestFile,
    pub results_key: String,
    pub class_name: Option<String>,
    /// Absent when the unit could not be loaded or written
    pub captured: Option<CapturedResults>,
    pub results: Vec<TestRunResult>,
    pub load_error: Option<String>,
}

impl UnitRecord {
    fn failed(unit: &PlannedUnit, message: String) -> Self {
        Self {
            category: unit.category.clone(),
            file: unit.file.clone(),
            results_key: unit.results_key.clone(),
            class_name: None,
            captured: None,
            results: Vec::new(),
            load_error: Some(message),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    pub run_dir: Option<PathBuf>,
    pub units: Vec<UnitRecord>,
}

impl RunOutcome {
    /// Unit name to captured results, for units that produced any
    pub fn captured(&self) -> impl Iterator<Item = (&str, &CapturedResults)> {
        self.units
            .iter()
            .filter_map(|u| u.captured.as_ref().map(|c| (u.file.unit_name.as_str(), c)))
    }

    pub fn results(&self) -> impl Iterator<Item = &TestRunResult> {
        self.units.iter().flat_map(|u| u.results.iter())
    }
}

pub struct Orchestrator<'a> {
    loader: &'a dyn SuiteLoader,
    store: &'a mut dyn ResultsStore,
    progress: ProgressBar,
}

impl<'a> Orchestrator<'a> {
    pub fn new(loader: &'a dyn SuiteLoader, store: &'a mut dyn ResultsStore) -> Self {
        Self {
            loader,
            store,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Run every planned unit in order, calling `on_unit` as each completes.
    ///
    /// Only loader preparation and results-store preparation can fail the
    /// whole batch; both happen before any test executes.
    pub fn run(
        &mut self,
        units: &[PlannedUnit],
        mut on_unit: impl FnMut(&UnitRecord),
    ) -> Result<RunOutcome> {
        self.loader.prepare()?;
        self.store.prepare()?;

        self.progress.set_length(units.len() as u64);
        let mut outcome = RunOutcome {
            run_dir: self.store.run_dir().map(Path::to_path_buf),
            units: Vec::with_capacity(units.len()),
        };

        for unit in units {
            self.progress.set_message(unit.file.unit_name.clone());
            let record = self.run_one(unit);
            if let Some(error) = &record.load_error {
                log::warn!("{}: {}", unit.file.path.display(), error);
            }
            on_unit(&record);
            outcome.units.push(record);
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        log::info!(
            "Ran {} units, {} tests",
            outcome.units.len(),
            outcome.results().count()
        );
        Ok(outcome)
    }

    fn run_one(&mut self, planned: &PlannedUnit) -> UnitRecord {
        let mut unit = match self.loader.load(&planned.file) {
            Ok(unit) => unit,
            Err(e) => return UnitRecord::failed(planned, e.to_string()),
        };
        log::debug!(
            "Running {} ({} cases)",
            planned.file.unit_name,
            unit.cases.len()
        );

        let source = planned
            .file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| planned.file.unit_name.clone());

        let written = self
            .store
            .open_unit(&planned.results_key)
            .and_then(|mut sink| {
                let results = run_unit(&mut unit, sink.as_mut(), &source)?;
                Ok((sink.close()?, results))
            });

        match written {
            Ok((captured, results)) => UnitRecord {
                category: planned.category.clone(),
                file: planned.file.clone(),
                results_key: planned.results_key.clone(),
                class_name: Some(unit.class_name),
                captured: Some(captured),
                results,
                load_error: None,
            },
            Err(e) => UnitRecord::failed(planned, e.to_string()),
        }
    }
}

/// Run all cases of a unit, streaming the transcript into `sink`.
pub fn run_unit(unit: &mut TestUnit, sink: &mut dyn UnitSink, source: &str) -> Result<Vec<TestRunResult>> {
    sink.write_line(&transcript::suite_header(&unit.class_name))?;
    sink.write_line(transcript::STARTED)?;

    let mut executed = Vec::with_capacity(unit.cases.len());
    for case in unit.cases.iter_mut() {
        let id = TestId::new(&unit.class_name, case.name());
        let result = execute_case(case.as_mut());
        let status = match &result {
            Ok(()) => TestStatus::Pass,
            Err(f) if f.kind == FailureKind::Failure => TestStatus::Fail,
            Err(_) => TestStatus::Warn,
        };
        let line = transcript::status_line(&id, status);
        sink.write_line(&line)?;
        executed.push((id, status, line, result.err()));
    }

    let mut failures = 0;
    let mut errors = 0;
    let mut results = Vec::with_capacity(executed.len());
    let mut details_started = false;

    for (id, status, line, failure) in executed {
        let mut output = line;
        if let Some(failure) = failure {
            match failure.kind {
                FailureKind::Failure => failures += 1,
                FailureKind::Error => errors += 1,
            }
            if !details_started {
                sink.write_line("")?;
                details_started = true;
            }
            for detail in transcript::failure_detail(failures + errors, &id, &failure, source) {
                sink.write_line(&detail)?;
                output.push('\n');
                output.push_str(&detail);
            }
        }
        results.push(TestRunResult::new(id, status, output));
    }

    sink.write_line("")?;
    sink.write_line(&transcript::summary_line(results.len(), failures, errors))?;
    Ok(results)
}

/// Setup, body, teardown. Teardown always runs; the first failure wins.
pub fn execute_case(case: &mut dyn TestCase) -> CaseResult {
    let outcome = guarded(|| case.setup()).and_then(|()| guarded(|| case.run()));
    let teardown = guarded(|| case.teardown());
    outcome.and(teardown)
}

fn guarded(f: impl FnOnce() -> CaseResult) -> CaseResult {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(CaseFailure::error(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ResultParser;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn planned(unit: &str) -> PlannedUnit {
        PlannedUnit {
            category: "Face".to_string(),
            file: TestFile::new(PathBuf::from(format!("Face/{}.rb", unit))),
            results_key: unit.to_string(),
        }
    }

    fn face_loader(log: Rc<RefCell<Vec<String>>>) -> RegistryLoader {
        RegistryLoader::new().register("TC_Face", move || {
            let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
            TestUnit::new("TC_Face")
                .with_case(FnCase::new("test_area", move || {
                    a.borrow_mut().push("area".into());
                    Ok(())
                }))
                .with_case(FnCase::new("test_pushpull_large", move || {
                    b.borrow_mut().push("pushpull".into());
                    Err(CaseFailure::failure("expected 6 faces"))
                }))
                .with_case(
                    FnCase::new("test_explode", || panic!("boom"))
                        .with_teardown(move || {
                            c.borrow_mut().push("explode teardown".into());
                            Ok(())
                        }),
                )
                .with_case(FnCase::new("test_normal", move || {
                    d.borrow_mut().push("normal".into());
                    Ok(())
                }))
        })
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let loader = face_loader(log.clone());
        let mut store = MemoryStore;
        let mut orchestrator = Orchestrator::new(&loader, &mut store);

        let outcome = orchestrator.run(&[planned("TC_Face")], |_| {}).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["area", "pushpull", "explode teardown", "normal"]
        );
        let statuses: Vec<_> = outcome.results().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                TestStatus::Pass,
                TestStatus::Fail,
                TestStatus::Warn,
                TestStatus::Pass
            ]
        );
        assert!(outcome.run_dir.is_none());
    }

    #[test]
    fn test_transcript_round_trips_through_parser() {
        let loader = face_loader(Rc::new(RefCell::new(Vec::new())));
        let mut store = MemoryStore;
        let outcome = Orchestrator::new(&loader, &mut store)
            .run(&[planned("TC_Face")], |_| {})
            .unwrap();

        let text = outcome.units[0].captured.as_ref().unwrap().read().unwrap();
        let mut parser = ResultParser::new("rb");
        let report = parser.parse_output(&text);

        assert_eq!(report.element_id.as_deref(), Some("TC_Face.rb"));
        let parsed: Vec<_> = report.outcomes().map(|r| (r.id.clone(), r.status, r.size)).collect();
        let executed: Vec<_> = outcome.results().map(|r| (r.id.clone(), r.status, r.size)).collect();
        assert_eq!(parsed, executed);
        assert!(text.contains("expected 6 faces"));
        assert!(text.contains("panicked: boom"));
        assert!(text.ends_with("4 tests, 1 failures, 1 errors\n"));
    }

    #[test]
    fn test_failure_output_attached_to_result() {
        let loader = face_loader(Rc::new(RefCell::new(Vec::new())));
        let mut store = MemoryStore;
        let outcome = Orchestrator::new(&loader, &mut store)
            .run(&[planned("TC_Face")], |_| {})
            .unwrap();

        let failed = outcome.results().nth(1).unwrap();
        assert!(failed.output.starts_with("test_pushpull_large(TC_Face): F"));
        assert!(failed.output.contains("[TC_Face.rb]:"));
    }

    #[test]
    fn test_unloadable_unit_is_skipped() {
        let loader = face_loader(Rc::new(RefCell::new(Vec::new())));
        let mut store = MemoryStore;
        let mut seen = Vec::new();
        let outcome = Orchestrator::new(&loader, &mut store)
            .run(&[planned("TC_Missing"), planned("TC_Face")], |record| {
                seen.push(record.file.unit_name.clone())
            })
            .unwrap();

        assert_eq!(seen, vec!["TC_Missing", "TC_Face"]);
        assert!(outcome.units[0].load_error.is_some());
        assert!(outcome.units[0].captured.is_none());
        assert_eq!(outcome.captured().count(), 1);
    }

    #[test]
    fn test_setup_failure_skips_body_but_runs_teardown() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let (body, teardown) = (ran.clone(), ran.clone());
        let mut case = FnCase::new("test_x", move || {
            body.borrow_mut().push("body");
            Ok(())
        })
        .with_setup(|| Err(CaseFailure::error("no model")))
        .with_teardown(move || {
            teardown.borrow_mut().push("teardown");
            Ok(())
        });

        let result = execute_case(&mut case);
        assert_eq!(result.unwrap_err().message, "no model");
        assert_eq!(*ran.borrow(), vec!["teardown"]);
    }

    #[test]
    fn test_teardown_failure_reported_when_body_passes() {
        let mut case = FnCase::new("test_x", || Ok(()))
            .with_teardown(|| Err(CaseFailure::failure("leaked entity")));
        assert_eq!(execute_case(&mut case).unwrap_err().message, "leaked entity");
    }

    #[test]
    fn test_directory_store_creates_run_before_tests() {
        let root = tempfile::tempdir().unwrap();
        let loader = face_loader(Rc::new(RefCell::new(Vec::new())));
        let run = ResultsRun::create(root.path()).unwrap();
        let mut store = DirectoryStore::new(run.clone());

        let outcome = Orchestrator::new(&loader, &mut store)
            .run(&[planned("TC_Face")], |_| {})
            .unwrap();

        assert_eq!(outcome.run_dir.as_deref(), Some(run.dir()));
        let (name, captured) = outcome.captured().next().unwrap();
        assert_eq!(name, "TC_Face");
        assert_eq!(captured, &CapturedResults::File(run.unit_path("TC_Face")));
    }

    #[test]
    fn test_plan_paths_uses_parent_as_category() {
        let planned = plan_paths(&[PathBuf::from("/suite/Edge/TC_Edge.rb")]);
        assert_eq!(planned[0].category, "Edge");
        assert_eq!(planned[0].file.unit_name, "TC_Edge");
        assert_eq!(planned[0].results_key, "TC_Edge");
    }

    #[test]
    fn test_repeated_unit_names_get_category_keys() {
        let planned = plan_paths(&[
            PathBuf::from("/suite/A/TC_Common.rb"),
            PathBuf::from("/suite/A/TC_Face.rb"),
            PathBuf::from("/suite/B/TC_Common.rb"),
        ]);
        let keys: Vec<_> = planned.iter().map(|u| u.results_key.as_str()).collect();
        assert_eq!(keys, vec!["A_TC_Common", "TC_Face", "B_TC_Common"]);
    }

    #[test]
    fn test_repeated_unit_names_write_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let run = ResultsRun::resume(dir.path().join("run")).unwrap();
        let mut store = DirectoryStore::new(run.clone());
        let loader = RegistryLoader::new().register("TC_Common", || {
            TestUnit::new("TC_Common").with_case(FnCase::new("test_shared", || Ok(())))
        });
        let units = plan_paths(&[
            PathBuf::from("A/TC_Common.rb"),
            PathBuf::from("B/TC_Common.rb"),
        ]);

        let outcome = Orchestrator::new(&loader, &mut store)
            .run(&units, |_| {})
            .unwrap();

        let captured: Vec<_> = outcome.captured().map(|(_, c)| c.clone()).collect();
        assert_eq!(
            captured,
            vec![
                CapturedResults::File(run.unit_path("A_TC_Common")),
                CapturedResults::File(run.unit_path("B_TC_Common")),
            ]
        );
        assert!(run.unit_path("A_TC_Common").is_file());
        assert!(run.unit_path("B_TC_Common").is_file());
        assert!(!run.unit_path("TC_Common").exists());
    }
}
