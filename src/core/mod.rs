//! Core domain types shared by discovery, execution, parsing and coverage.

pub mod types;

pub use types::{
    results_file_name, unit_name_for, Percentage, TestCategory, TestFile, TestId, TestRunResult,
    TestSize, TestStatus,
};
