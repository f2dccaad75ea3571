use crate::core::{Percentage, TestRunResult, TestSize, TestStatus};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Running totals across every outcome seen in a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub pass: usize,
    pub fail: usize,
    pub warn: usize,
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl Tally {
    pub fn record(&mut self, result: &TestRunResult) {
        match result.status {
            TestStatus::Pass => self.pass += 1,
            TestStatus::Fail => self.fail += 1,
            TestStatus::Warn => self.warn += 1,
        }
        match result.size {
            TestSize::Small => self.small += 1,
            TestSize::Medium => self.medium += 1,
            TestSize::Large => self.large += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail + self.warn
    }

    pub fn pass_rate(&self) -> Percentage {
        Percentage::of(self.pass, self.total())
    }

    pub fn fail_rate(&self) -> Percentage {
        Percentage::of(self.fail, self.total())
    }

    pub fn warn_rate(&self) -> Percentage {
        Percentage::of(self.warn, self.total())
    }

    /// CSS class summarising the worst status seen
    pub fn status_class(&self) -> &'static str {
        if self.warn > 0 {
            "warn"
        } else if self.fail > 0 {
            "fail"
        } else if self.pass > 0 {
            "pass"
        } else {
            "empty"
        }
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.pass += other.pass;
        self.fail += other.fail;
        self.warn += other.warn;
        self.small += other.small;
        self.medium += other.medium;
        self.large += other.large;
    }
}

impl<'a> FromIterator<&'a TestRunResult> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a TestRunResult>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for result in iter {
            tally.record(result);
        }
        tally
    }
}
