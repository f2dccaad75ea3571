//! Test name normalization for coverage matching.

use crate::core::TestRunResult;

const TEST_PREFIX: &str = "test_";

/// Suffix markers, in priority order. The first one present wins.
pub const SUFFIX_MARKERS: &[&str] = &[
    "_api_example",
    "_true_and_false",
    "_when",
    "_simple",
    "_edgecases",
    "_known_case",
    "_zero",
];

/// Strip the `test_` prefix, then cut at the first marker found.
///
/// `test_rotate_true_and_false_edge` becomes `rotate`;
/// `test_simple_move` has no marker and becomes `simple_move`.
pub fn normalize_test_name(method: &str) -> &str {
    let stripped = method.strip_prefix(TEST_PREFIX).unwrap_or(method);
    SUFFIX_MARKERS
        .iter()
        .find_map(|marker| stripped.find(marker))
        .map(|pos| &stripped[..pos])
        .unwrap_or(stripped)
}

/// API class a suite class covers, e.g. `TC_Face` covers `Face`.
pub fn covered_class<'a>(suite_class: &'a str, class_prefix: &str) -> &'a str {
    if class_prefix.is_empty() {
        return suite_class;
    }
    suite_class.strip_prefix(class_prefix).unwrap_or(suite_class)
}

/// A passed test reduced to what coverage matching needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassedTest {
    pub class: String,
    pub normalized_name: String,
}

impl PassedTest {
    pub fn new(class: impl Into<String>, normalized_name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            normalized_name: normalized_name.into(),
        }
    }

    /// Build from a parsed outcome; `None` unless it passed.
    pub fn from_result(result: &TestRunResult, class_prefix: &str) -> Option<Self> {
        result.passed().then(|| {
            Self::new(
                covered_class(&result.id.class, class_prefix),
                normalize_test_name(&result.id.method),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TestId, TestStatus};
    use proptest::prelude::*;

    #[test]
    fn test_truncates_at_first_marker() {
        assert_eq!(normalize_test_name("test_rotate_true_and_false_edge"), "rotate");
        assert_eq!(normalize_test_name("test_pushpull_api_example"), "pushpull");
        assert_eq!(normalize_test_name("test_area_zero"), "area");
    }

    #[test]
    fn test_no_marker_keeps_stripped_name() {
        assert_eq!(normalize_test_name("test_simple_move"), "simple_move");
        assert_eq!(normalize_test_name("test_explode"), "explode");
    }

    #[test]
    fn test_marker_priority_order() {
        // `_when` is checked before `_zero` regardless of position
        assert_eq!(normalize_test_name("test_a_zero_b_when_c"), "a_zero_b");
    }

    #[test]
    fn test_name_without_prefix() {
        assert_eq!(normalize_test_name("check_length_simple"), "check_length");
    }

    #[test]
    fn test_covered_class() {
        assert_eq!(covered_class("TC_Face", "TC_"), "Face");
        assert_eq!(covered_class("Face", "TC_"), "Face");
        assert_eq!(covered_class("TC_Face", ""), "TC_Face");
    }

    #[test]
    fn test_passed_test_from_result() {
        let pass = TestRunResult::new(
            TestId::new("TC_Face", "test_pushpull_api_example"),
            TestStatus::Pass,
            "",
        );
        let fail = TestRunResult::new(TestId::new("TC_Face", "test_area"), TestStatus::Fail, "");

        assert_eq!(
            PassedTest::from_result(&pass, "TC_"),
            Some(PassedTest::new("Face", "pushpull"))
        );
        assert_eq!(PassedTest::from_result(&fail, "TC_"), None);
    }

    proptest! {
        /// Normalization only ever shortens, and the result is a prefix of
        /// the name with `test_` removed.
        #[test]
        fn normalized_is_prefix_of_stripped(name in "test_[a-z_]{0,30}") {
            let stripped = name.strip_prefix("test_").unwrap();
            let normalized = normalize_test_name(&name);
            prop_assert!(stripped.starts_with(normalized));
        }

        /// Names without underscores hold no marker and only lose the prefix.
        #[test]
        fn marker_free_names_only_lose_prefix(name in "[a-y]{1,20}") {
            let full = format!("test_{}", name);
            prop_assert_eq!(normalize_test_name(&full), name.as_str());
        }
    }
}
