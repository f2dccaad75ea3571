//! Test-case abstraction and explicit suite registration.

use crate::core::TestFile;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// An assertion did not hold
    Failure,
    /// Something raised or crashed
    Error,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Failure => "Failure",
            FailureKind::Error => "Error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseFailure {
    pub kind: FailureKind,
    pub message: String,
    /// `file:line` or similar, when the case knows it
    pub location: Option<String>,
}

impl CaseFailure {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Failure,
            message: message.into(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Error,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

pub type CaseResult = std::result::Result<(), CaseFailure>;

/// One test case. Setup and teardown default to no-ops; teardown runs even
/// when setup or the body fails.
pub trait TestCase {
    fn name(&self) -> &str;

    fn setup(&mut self) -> CaseResult {
        Ok(())
    }

    fn run(&mut self) -> CaseResult;

    fn teardown(&mut self) -> CaseResult {
        Ok(())
    }
}

type CaseFn = Box<dyn FnMut() -> CaseResult>;

/// Test case built from closures.
pub struct FnCase {
    name: String,
    setup: Option<CaseFn>,
    body: CaseFn,
    teardown: Option<CaseFn>,
}

impl FnCase {
    pub fn new(name: impl Into<String>, body: impl FnMut() -> CaseResult + 'static) -> Self {
        Self {
            name: name.into(),
            setup: None,
            body: Box::new(body),
            teardown: None,
        }
    }

    pub fn with_setup(mut self, setup: impl FnMut() -> CaseResult + 'static) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    pub fn with_teardown(mut self, teardown: impl FnMut() -> CaseResult + 'static) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }
}

impl TestCase for FnCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self) -> CaseResult {
        self.setup.as_mut().map_or(Ok(()), |f| f())
    }

    fn run(&mut self) -> CaseResult {
        (self.body)()
    }

    fn teardown(&mut self) -> CaseResult {
        self.teardown.as_mut().map_or(Ok(()), |f| f())
    }
}

/// A loaded test unit: its class and cases in declaration order.
pub struct TestUnit {
    pub class_name: String,
    pub cases: Vec<Box<dyn TestCase>>,
}

impl TestUnit {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            cases: Vec::new(),
        }
    }

    pub fn with_case(mut self, case: impl TestCase + 'static) -> Self {
        self.cases.push(Box::new(case));
        self
    }
}

impl fmt::Debug for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUnit")
            .field("class_name", &self.class_name)
            .field("cases", &self.cases.iter().map(|c| c.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Turns a test file into a runnable unit.
pub trait SuiteLoader {
    /// Checked once before any test runs; an error aborts the batch.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn load(&self, file: &TestFile) -> Result<TestUnit>;
}

type UnitFactory = Box<dyn Fn() -> TestUnit>;

/// Loader backed by units registered in code, keyed by unit name.
#[derive(Default)]
pub struct RegistryLoader {
    factories: HashMap<String, UnitFactory>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        unit_name: impl Into<String>,
        factory: impl Fn() -> TestUnit + 'static,
    ) -> Self {
        self.factories.insert(unit_name.into(), Box::new(factory));
        self
    }
}

impl SuiteLoader for RegistryLoader {
    fn load(&self, file: &TestFile) -> Result<TestUnit> {
        self.factories
            .get(&file.unit_name)
            .map(|factory| factory())
            .ok_or_else(|| Error::load(&file.path, "no suite registered for this unit"))
    }
}
