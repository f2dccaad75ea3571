//! Results stores: where unit transcripts go.
//!
//! `DirectoryStore` writes one file per unit into a timestamped run
//! directory; `MemoryStore` keeps transcripts in memory.

use crate::core::results_file_name;
use crate::errors::{Error, IoResultExt, Result};
use chrono::{DateTime, Local, Timelike};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Where a unit's transcript ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CapturedResults {
    File(PathBuf),
    Buffered(String),
}

impl CapturedResults {
    pub fn read(&self) -> Result<String> {
        match self {
            CapturedResults::File(path) => {
                fs::read_to_string(path).with_path("Failed to read results", path)
            }
            CapturedResults::Buffered(text) => Ok(text.clone()),
        }
    }
}

/// An open output sink for one unit.
pub trait UnitSink {
    fn write_line(&mut self, line: &str) -> Result<()>;

    fn close(self: Box<Self>) -> Result<CapturedResults>;
}

pub trait ResultsStore {
    /// Called once before any test executes.
    fn prepare(&mut self) -> Result<()>;

    fn open_unit(&mut self, unit_name: &str) -> Result<Box<dyn UnitSink>>;

    /// Run directory, for stores that write to disk
    fn run_dir(&self) -> Option<&Path> {
        None
    }
}

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A timestamped results directory: `<root>/<YYYYmmdd-HHMMSS>-<disambiguator>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsRun {
    dir: PathBuf,
}

impl ResultsRun {
    /// Create a fresh, never-before-used run directory under `root`.
    ///
    /// The disambiguator combines sub-second nanoseconds with a process-wide
    /// sequence, and creation retries on collision, so two runs started in
    /// the same clock tick still get distinct directories.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).with_path("Failed to create results root", root)?;
        let now = Local::now();

        loop {
            let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
            let dir = root.join(run_dir_name(&now, seq));
            match fs::create_dir(&dir) {
                Ok(()) => {
                    log::info!("Results run directory: {}", dir.display());
                    return Ok(Self { dir });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::file_system("Failed to create run directory", dir, e)),
            }
        }
    }

    /// Reuse an existing run directory, creating it only if absent.
    pub fn resume(dir: PathBuf) -> Result<Self> {
        if !dir.is_dir() {
            fs::create_dir_all(&dir).with_path("Failed to create run directory", &dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn unit_path(&self, unit_name: &str) -> PathBuf {
        self.dir.join(results_file_name(unit_name))
    }
}

pub fn run_dir_name(now: &DateTime<Local>, seq: u64) -> String {
    format!(
        "{}-{:09}{:04}",
        now.format("%Y%m%d-%H%M%S"),
        now.nanosecond() % 1_000_000_000,
        seq % 10_000
    )
}

pub struct DirectoryStore {
    run: ResultsRun,
}

impl DirectoryStore {
    pub fn new(run: ResultsRun) -> Self {
        Self { run }
    }

    pub fn run(&self) -> &ResultsRun {
        &self.run
    }
}

impl ResultsStore for DirectoryStore {
    fn prepare(&mut self) -> Result<()> {
        let dir = self.run.dir();
        if !dir.is_dir() {
            fs::create_dir_all(dir).with_path("Failed to create run directory", dir)?;
        }
        Ok(())
    }

    fn open_unit(&mut self, unit_name: &str) -> Result<Box<dyn UnitSink>> {
        let path = self.run.unit_path(unit_name);
        let file = File::create(&path).with_path("Failed to create results file", &path)?;
        Ok(Box::new(FileSink {
            writer: BufWriter::new(file),
            path,
        }))
    }

    fn run_dir(&self) -> Option<&Path> {
        Some(self.run.dir())
    }
}

struct FileSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl UnitSink for FileSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line).with_path("Failed to write results", &self.path)
    }

    fn close(mut self: Box<Self>) -> Result<CapturedResults> {
        self.writer
            .flush()
            .with_path("Failed to flush results", &self.path)?;
        Ok(CapturedResults::File(self.path))
    }
}

/// Keeps transcripts in memory instead of writing them out.
#[derive(Debug, Default)]
pub struct MemoryStore;

impl ResultsStore for MemoryStore {
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn open_unit(&mut self, _unit_name: &str) -> Result<Box<dyn UnitSink>> {
        Ok(Box::new(MemorySink::default()))
    }
}

#[derive(Default)]
struct MemorySink {
    buffer: String,
}

impl UnitSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.buffer.push_str(line);
        self.buffer.push('\n');
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<CapturedResults> {
        Ok(CapturedResults::Buffered(self.buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_dir_name_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(run_dir_name(&now, 12), "20240309-140507-0000000000012");
    }

    #[test]
    fn test_runs_in_same_tick_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let first = ResultsRun::create(root.path()).unwrap();
        let second = ResultsRun::create(root.path()).unwrap();

        assert_ne!(first.dir(), second.dir());
        assert!(first.dir().is_dir());
        assert!(second.dir().is_dir());
    }

    #[test]
    fn test_resume_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("run");
        let run = ResultsRun::resume(dir.clone()).unwrap();
        std::fs::write(run.unit_path("TC_Face"), "kept").unwrap();

        let again = ResultsRun::resume(dir.clone()).unwrap();
        assert_eq!(again.dir(), dir.as_path());
        assert_eq!(
            std::fs::read_to_string(again.unit_path("TC_Face")).unwrap(),
            "kept"
        );
    }

    #[test]
    fn test_directory_store_writes_unit_file() {
        let root = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(ResultsRun::create(root.path()).unwrap());
        store.prepare().unwrap();

        let mut sink = store.open_unit("TC_Face").unwrap();
        sink.write_line("Loaded suite TC_Face").unwrap();
        let captured = sink.close().unwrap();

        let expected = store.run().unit_path("TC_Face");
        assert_eq!(captured, CapturedResults::File(expected.clone()));
        assert!(expected.ends_with("TC_Face_results.txt"));
        assert_eq!(captured.read().unwrap(), "Loaded suite TC_Face\n");
    }

    #[test]
    fn test_memory_store_buffers() {
        let mut store = MemoryStore;
        let mut sink = store.open_unit("TC_Face").unwrap();
        sink.write_line("a").unwrap();
        sink.write_line("b").unwrap();
        assert_eq!(
            sink.close().unwrap(),
            CapturedResults::Buffered("a\nb\n".to_string())
        );
        assert!(store.run_dir().is_none());
    }
}
