//! File-based handoff between a controller and a separate test host.
//!
//! The controller writes a manifest (one test file path per line) and a
//! pointer to the results run directory, then polls for the completion
//! sentinel. The host runs the manifest into that run directory and
//! touches the sentinel, or writes the failure marker with the error text
//! when the manifest could not be served. The controller consumes all of
//! these files once it is done waiting, whatever the outcome.

use crate::errors::{Error, IoResultExt, Result};
use crate::runner::{plan_paths, DirectoryStore, Orchestrator, ResultsRun, RunOutcome, SuiteLoader};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use indicatif::ProgressBar;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const MANIFEST_FILE: &str = "testup.manifest";
pub const SENTINEL_FILE: &str = "testup.done";
pub const RUN_POINTER_FILE: &str = "testup.run";
pub const FAILURE_FILE: &str = "testup.failed";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handoff {
    dir: PathBuf,
}

impl Handoff {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn sentinel_path(&self) -> PathBuf {
        self.dir.join(SENTINEL_FILE)
    }

    pub fn run_pointer_path(&self) -> PathBuf {
        self.dir.join(RUN_POINTER_FILE)
    }

    pub fn failure_path(&self) -> PathBuf {
        self.dir.join(FAILURE_FILE)
    }

    /// A manifest is waiting and has not been answered yet.
    pub fn is_pending(&self) -> bool {
        self.manifest_path().is_file()
            && !self.sentinel_path().exists()
            && !self.failure_path().exists()
    }

    pub fn is_complete(&self) -> bool {
        self.sentinel_path().exists()
    }

    /// Publish a manifest. Any stale sentinel or failure marker is removed
    /// first so the wait that follows cannot see a previous run's answer.
    pub fn write_manifest(&self, paths: &[PathBuf], run_dir: &Path) -> Result<()> {
        fs::create_dir_all(&self.dir).with_path("Failed to create handoff directory", &self.dir)?;
        remove_if_present(&self.sentinel_path())?;
        remove_if_present(&self.failure_path())?;

        let mut manifest = String::new();
        for path in paths {
            manifest.push_str(&absolute(path).to_string_lossy());
            manifest.push('\n');
        }

        let pointer = self.run_pointer_path();
        fs::write(&pointer, absolute(run_dir).to_string_lossy().as_bytes())
            .with_path("Failed to write run pointer", &pointer)?;
        // Manifest last: its presence is what the host watches for
        let manifest_path = self.manifest_path();
        fs::write(&manifest_path, manifest).with_path("Failed to write manifest", &manifest_path)?;

        log::info!(
            "Handoff manifest with {} files written to {}",
            paths.len(),
            manifest_path.display()
        );
        Ok(())
    }

    pub fn read_manifest(&self) -> Result<Vec<PathBuf>> {
        let path = self.manifest_path();
        let text = fs::read_to_string(&path).with_path("Failed to read manifest", &path)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    pub fn read_run_dir(&self) -> Result<PathBuf> {
        let path = self.run_pointer_path();
        let text = fs::read_to_string(&path).with_path("Failed to read run pointer", &path)?;
        let dir = text.trim();
        if dir.is_empty() {
            return Err(Error::Handoff(format!("empty run pointer in {}", path.display())));
        }
        Ok(PathBuf::from(dir))
    }

    pub fn signal_complete(&self) -> Result<()> {
        let sentinel = self.sentinel_path();
        fs::write(&sentinel, b"").with_path("Failed to write sentinel", &sentinel)?;
        log::debug!("Sentinel written: {}", sentinel.display());
        Ok(())
    }

    /// Answer the manifest with an error instead of results.
    pub fn signal_failed(&self, message: &str) -> Result<()> {
        let marker = self.failure_path();
        fs::write(&marker, message.as_bytes()).with_path("Failed to write failure marker", &marker)?;
        log::debug!("Failure marker written: {}", marker.display());
        Ok(())
    }

    /// Error text left by a host that could not serve the manifest.
    pub fn read_failure(&self) -> Option<String> {
        fs::read_to_string(self.failure_path()).ok()
    }

    /// Block until the sentinel or the failure marker appears.
    ///
    /// Polls every `poll` until `timeout` (when set) runs out. A message on
    /// `cancel`, or its sender being dropped, stops the wait. Pass
    /// `crossbeam::channel::never()` to wait without cancellation. A failure
    /// marker ends the wait with `Error::Handoff` carrying the host's error.
    pub fn wait_for_completion(
        &self,
        poll: Duration,
        timeout: Option<Duration>,
        cancel: &Receiver<()>,
    ) -> Result<()> {
        let sentinel = self.sentinel_path();
        let marker = self.failure_path();
        wait_until(|| sentinel.exists() || marker.exists(), poll, timeout, cancel).map_err(
            |stop| match stop {
                WaitStop::TimedOut => Error::Timeout {
                    secs: timeout.map(|t| t.as_secs()).unwrap_or_default(),
                    sentinel: sentinel.clone(),
                },
                WaitStop::Cancelled => Error::Cancelled {
                    sentinel: sentinel.clone(),
                },
            },
        )?;

        if !sentinel.exists() {
            if let Some(message) = self.read_failure() {
                return Err(Error::Handoff(format!("test host failed: {}", message.trim())));
            }
        }
        Ok(())
    }

    /// Block until a manifest is pending; used by the host loop.
    pub fn wait_for_manifest(
        &self,
        poll: Duration,
        timeout: Option<Duration>,
        cancel: &Receiver<()>,
    ) -> Result<bool> {
        match wait_until(|| self.is_pending(), poll, timeout, cancel) {
            Ok(()) => Ok(true),
            Err(WaitStop::TimedOut) => Ok(false),
            Err(WaitStop::Cancelled) => Err(Error::Cancelled {
                sentinel: self.sentinel_path(),
            }),
        }
    }

    /// Remove manifest, pointer, sentinel and failure marker. Called after
    /// results have been read, and when the wait for them gave up.
    pub fn consume(&self) -> Result<()> {
        remove_if_present(&self.sentinel_path())?;
        remove_if_present(&self.failure_path())?;
        remove_if_present(&self.manifest_path())?;
        remove_if_present(&self.run_pointer_path())?;
        Ok(())
    }

    /// Host side: execute the pending manifest into the run directory the
    /// controller named, then signal completion. When the batch cannot run
    /// at all the failure marker is written instead, so the controller stops
    /// waiting and the manifest is no longer pending.
    pub fn serve(&self, loader: &dyn SuiteLoader, progress: ProgressBar) -> Result<RunOutcome> {
        match self.execute(loader, progress) {
            Ok(outcome) => {
                self.signal_complete()?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(marker) = self.signal_failed(&e.to_string()) {
                    log::warn!("{}", marker);
                }
                Err(e)
            }
        }
    }

    fn execute(&self, loader: &dyn SuiteLoader, progress: ProgressBar) -> Result<RunOutcome> {
        let paths = self.read_manifest()?;
        let run = ResultsRun::resume(self.read_run_dir()?)?;
        log::info!(
            "Serving manifest: {} files into {}",
            paths.len(),
            run.dir().display()
        );

        let mut store = DirectoryStore::new(run);
        Orchestrator::new(loader, &mut store)
            .with_progress(progress)
            .run(&plan_paths(&paths), |_| {})
    }
}

enum WaitStop {
    TimedOut,
    Cancelled,
}

fn wait_until(
    mut done: impl FnMut() -> bool,
    poll: Duration,
    timeout: Option<Duration>,
    cancel: &Receiver<()>,
) -> std::result::Result<(), WaitStop> {
    let started = Instant::now();
    loop {
        if done() {
            return Ok(());
        }
        let nap = match timeout {
            Some(limit) => {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    return Err(WaitStop::TimedOut);
                }
                poll.min(limit - elapsed)
            }
            None => poll,
        };
        match cancel.recv_timeout(nap) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return Err(WaitStop::Cancelled),
        }
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::file_system("Failed to remove handoff file", path, e)),
    }
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TestFile;
    use crate::runner::{FnCase, RegistryLoader, TestUnit};
    use crossbeam::channel::{bounded, never};

    const FAST: Duration = Duration::from_millis(10);

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("results/run-1");
        std::fs::create_dir_all(&run_dir).unwrap();
        let handoff = Handoff::new(dir.path().join("handoff"));

        let paths = vec![PathBuf::from("/suite/Face/TC_Face.rb"), PathBuf::from("/suite/Edge/TC_Edge.rb")];
        handoff.write_manifest(&paths, &run_dir).unwrap();

        assert!(handoff.is_pending());
        assert_eq!(handoff.read_manifest().unwrap(), paths);
        assert_eq!(
            handoff.read_run_dir().unwrap(),
            std::fs::canonicalize(&run_dir).unwrap()
        );
    }

    #[test]
    fn test_write_manifest_clears_stale_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = Handoff::new(dir.path());
        handoff.signal_complete().unwrap();

        handoff.write_manifest(&[], dir.path()).unwrap();
        assert!(!handoff.is_complete());
        assert!(handoff.is_pending());
    }

    #[test]
    fn test_wait_returns_once_sentinel_exists() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = Handoff::new(dir.path());
        handoff.signal_complete().unwrap();
        handoff
            .wait_for_completion(FAST, Some(Duration::from_secs(1)), &never())
            .unwrap();
    }

    #[test]
    fn test_wait_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = Handoff::new(dir.path());
        let err = handoff
            .wait_for_completion(FAST, Some(Duration::from_millis(50)), &never())
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn test_wait_is_cancellable() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = Handoff::new(dir.path());
        let (tx, rx) = bounded(1);
        tx.send(()).unwrap();
        let err = handoff.wait_for_completion(FAST, None, &rx).unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));

        let (tx, rx) = bounded::<()>(1);
        drop(tx);
        let err = handoff.wait_for_completion(FAST, None, &rx).unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[test]
    fn test_consume_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = Handoff::new(dir.path());
        handoff.write_manifest(&[], dir.path()).unwrap();
        handoff.signal_complete().unwrap();

        handoff.consume().unwrap();
        assert!(!handoff.manifest_path().exists());
        assert!(!handoff.sentinel_path().exists());
        assert!(!handoff.run_pointer_path().exists());
        // Consuming twice is harmless
        handoff.consume().unwrap();
    }

    #[test]
    fn test_serve_writes_results_and_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let suite = dir.path().join("Face");
        std::fs::create_dir_all(&suite).unwrap();
        let test_file = suite.join("TC_Face.rb");
        std::fs::write(&test_file, "").unwrap();
        let run = ResultsRun::create(&dir.path().join("results")).unwrap();

        let handoff = Handoff::new(dir.path().join("handoff"));
        handoff.write_manifest(&[test_file], run.dir()).unwrap();

        let loader = RegistryLoader::new().register("TC_Face", || {
            TestUnit::new("TC_Face").with_case(FnCase::new("test_area", || Ok(())))
        });
        let outcome = handoff.serve(&loader, ProgressBar::hidden()).unwrap();

        assert_eq!(outcome.units.len(), 1);
        assert_eq!(outcome.units[0].category, "Face");
        assert!(handoff.is_complete());
        assert!(run.unit_path("TC_Face").is_file());
        handoff
            .wait_for_completion(FAST, Some(Duration::from_secs(1)), &never())
            .unwrap();
    }

    struct MissingInterpreter;

    impl SuiteLoader for MissingInterpreter {
        fn prepare(&self) -> Result<()> {
            Err(Error::config("runner program 'ruby' not found"))
        }

        fn load(&self, file: &TestFile) -> Result<TestUnit> {
            Err(Error::load(&file.path, "not prepared"))
        }
    }

    #[test]
    fn test_serve_failure_writes_marker_and_ends_wait() {
        let dir = tempfile::tempdir().unwrap();
        let run = ResultsRun::create(&dir.path().join("results")).unwrap();
        let handoff = Handoff::new(dir.path().join("handoff"));
        handoff
            .write_manifest(&[PathBuf::from("/suite/Face/TC_Face.rb")], run.dir())
            .unwrap();

        let err = handoff
            .serve(&MissingInterpreter, ProgressBar::hidden())
            .unwrap_err();
        assert!(err.is_config());
        assert!(!handoff.is_complete());
        assert!(!handoff.is_pending());
        assert!(handoff.read_failure().unwrap().contains("'ruby' not found"));

        let started = Instant::now();
        let err = handoff
            .wait_for_completion(FAST, Some(Duration::from_secs(30)), &never())
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            Error::Handoff(message) => assert!(message.contains("'ruby' not found")),
            other => panic!("unexpected error: {}", other),
        }

        handoff.consume().unwrap();
        assert!(!handoff.failure_path().exists());
        assert!(!handoff.manifest_path().exists());
    }

    #[test]
    fn test_new_manifest_clears_stale_failure() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = Handoff::new(dir.path());
        handoff.signal_failed("previous run").unwrap();

        handoff.write_manifest(&[], dir.path()).unwrap();
        assert!(handoff.read_failure().is_none());
        assert!(handoff.is_pending());
    }
}
