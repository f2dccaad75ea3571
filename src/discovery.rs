//! Test discovery.
//!
//! A tests root holds one directory per category. Each category contributes
//! the test-source files sitting directly inside it; anything deeper (asset
//! folders, fixtures) is never looked at.

use crate::core::{TestCategory, TestFile};
use crate::errors::{Error, IoResultExt, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct TestWalker {
    root: PathBuf,
    extension: String,
    intro_file: String,
    category_filter: Option<glob::Pattern>,
    unit_filter: Option<glob::Pattern>,
}

impl TestWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extension: "rb".to_string(),
            intro_file: "intro.html".to_string(),
            category_filter: None,
            unit_filter: None,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_intro_file(mut self, intro_file: impl Into<String>) -> Self {
        self.intro_file = intro_file.into();
        self
    }

    /// Keep only categories whose name matches `pattern`
    pub fn with_category_filter(mut self, pattern: &str) -> Result<Self> {
        self.category_filter = Some(glob::Pattern::new(pattern)?);
        Ok(self)
    }

    /// Keep only units whose name matches `pattern`
    pub fn with_unit_filter(mut self, pattern: &str) -> Result<Self> {
        self.unit_filter = Some(glob::Pattern::new(pattern)?);
        Ok(self)
    }

    pub fn walk(&self) -> Result<Vec<TestCategory>> {
        if !self.root.is_dir() {
            return Err(Error::config_with_path(
                format!("tests directory not found: {}", self.root.display()),
                &self.root,
            ));
        }

        let mut categories = Vec::new();
        for dir in list_entries(&self.root)?.into_iter().filter(|p| p.is_dir()) {
            let name = file_name(&dir);
            if name.starts_with('.') || !self.category_matches(&name) {
                continue;
            }
            categories.push(self.read_category(dir, name)?);
        }

        log::debug!(
            "Discovered {} categories under {}",
            categories.len(),
            self.root.display()
        );
        Ok(categories)
    }

    fn read_category(&self, dir: PathBuf, name: String) -> Result<TestCategory> {
        let files = list_entries(&dir)?
            .into_iter()
            .filter(|p| p.is_file() && self.is_test_source(p))
            .map(TestFile::new)
            .filter(|f| self.unit_matches(&f.unit_name))
            .collect();
        let intro = read_intro(&dir.join(&self.intro_file));

        Ok(TestCategory {
            name,
            path: dir,
            files,
            intro,
        })
    }

    fn is_test_source(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy() == self.extension.as_str())
            .unwrap_or(false)
    }

    fn category_matches(&self, name: &str) -> bool {
        self.category_filter
            .as_ref()
            .map(|p| p.matches(name))
            .unwrap_or(true)
    }

    fn unit_matches(&self, name: &str) -> bool {
        self.unit_filter
            .as_ref()
            .map(|p| p.matches(name))
            .unwrap_or(true)
    }
}

/// Discover categories with default file conventions.
pub fn discover(root: &Path, extension: &str) -> Result<Vec<TestCategory>> {
    TestWalker::new(root.to_path_buf())
        .with_extension(extension)
        .walk()
}

/// Immediate children of `dir`, sorted by file name.
pub(crate) fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            Error::file_system("Failed to list directory", path, source)
        })?;
        entries.push(entry.into_path());
    }
    Ok(entries)
}

fn read_intro(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path).with_path("Failed to read intro", path) {
        Ok(text) => Some(text),
        Err(Error::FileSystem { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            None
        }
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
