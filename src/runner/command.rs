//! Loader for test sources executed by an external interpreter.
//!
//! The source file is scanned for a `class <Name>` declaration and for
//! `def test_<name>` methods. Each method becomes a case that runs the
//! configured command with `{file}`, `{test}` and `{class}` substituted.

use super::case::{CaseFailure, CaseResult, SuiteLoader, TestCase, TestUnit};
use crate::core::TestFile;
use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;

static CLASS_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*class\s+([A-Za-z_][A-Za-z0-9_:]*)").unwrap());
static TEST_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*def\s+(test_[A-Za-z0-9_]*[?!]?)").unwrap());

#[derive(Clone, Debug)]
pub struct CommandLoader {
    program: String,
    args: Vec<String>,
}

impl CommandLoader {
    /// Build from a whitespace-separated template such as
    /// `ruby {file} --name {test}`.
    pub fn from_template(template: &str) -> Result<Self> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::config("runner command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SuiteLoader for CommandLoader {
    fn prepare(&self) -> Result<()> {
        which::which(&self.program).map_err(|e| {
            Error::config(format!(
                "runner program '{}' not found: {}",
                self.program, e
            ))
        })?;
        Ok(())
    }

    fn load(&self, file: &TestFile) -> Result<TestUnit> {
        let source = std::fs::read_to_string(&file.path)
            .map_err(|e| Error::load(&file.path, e.to_string()))?;
        let declared = scan_source(&source);
        let class_name = declared
            .class_name
            .unwrap_or_else(|| file.unit_name.clone());

        let mut unit = TestUnit::new(class_name.clone());
        for test in declared.tests {
            unit = unit.with_case(CommandCase {
                program: self.program.clone(),
                args: substitute(&self.args, &file.path, &test, &class_name),
                name: test,
            });
        }
        Ok(unit)
    }
}

/// Declarations found in a test source.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeclaredSuite {
    pub class_name: Option<String>,
    /// Test methods in declaration order, without duplicates
    pub tests: Vec<String>,
}

pub fn scan_source(source: &str) -> DeclaredSuite {
    let class_name = CLASS_DECL
        .captures(source)
        .map(|caps| caps[1].to_string());
    let mut tests: Vec<String> = Vec::new();
    for caps in TEST_DECL.captures_iter(source) {
        let name = caps[1].to_string();
        if !tests.contains(&name) {
            tests.push(name);
        }
    }
    DeclaredSuite { class_name, tests }
}

fn substitute(args: &[String], file: &std::path::Path, test: &str, class: &str) -> Vec<String> {
    let file = file.to_string_lossy();
    args.iter()
        .map(|arg| {
            arg.replace("{file}", &file)
                .replace("{test}", test)
                .replace("{class}", class)
        })
        .collect()
}

struct CommandCase {
    name: String,
    program: String,
    args: Vec<String>,
}

impl TestCase for CommandCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> CaseResult {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| CaseFailure::error(format!("failed to start {}: {}", self.program, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = last_line(&stderr)
            .or_else(|| last_line(&stdout))
            .map(str::to_string)
            .unwrap_or_else(|| format!("exited with {}", output.status));

        match output.status.code() {
            Some(_) => Err(CaseFailure::failure(message)),
            // Killed by a signal
            None => Err(CaseFailure::error(message)),
        }
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}
