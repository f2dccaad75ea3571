//! Static HTML rendering of a coverage analysis.

use super::CoverageReport;
use crate::core::Percentage;
use html_escape::encode_text;
use std::fmt::Write;

/// Badge colour tier for a coverage value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CoverageTier {
    None,
    Partial,
    Full,
    Undefined,
}

impl CoverageTier {
    pub fn of(percentage: Percentage) -> Self {
        match percentage {
            Percentage::Undefined => CoverageTier::Undefined,
            Percentage::Defined(v) if v <= 0.0 => CoverageTier::None,
            Percentage::Defined(v) if v >= 100.0 => CoverageTier::Full,
            Percentage::Defined(_) => CoverageTier::Partial,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            CoverageTier::None => "#d9534f",
            CoverageTier::Partial => "#f0ad4e",
            CoverageTier::Full => "#5cb85c",
            CoverageTier::Undefined => "#999999",
        }
    }
}

pub fn tests_phrase(count: usize) -> String {
    if count == 1 {
        "1 test".to_string()
    } else {
        format!("{} tests", count)
    }
}

pub fn render_coverage_html(report: &CoverageReport) -> String {
    let mut html = String::new();
    let title = encode_text(&report.title);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body style=\"font-family: sans-serif; margin: 2em;\">\n<h1>{title}</h1>\n"
    );
    let _ = writeln!(
        html,
        "<p style=\"font-size: 1.3em;\">Total coverage: {} ({} of {} methods)</p>",
        badge(report.total),
        report.covered_methods,
        report.total_methods
    );

    for (class, coverage) in &report.classes {
        let _ = writeln!(
            html,
            "<div style=\"margin-top: 1.5em;\">\n<h2>{} {}</h2>",
            badge(coverage.percentage()),
            encode_text(class)
        );

        let _ = writeln!(html, "<h3>Covered</h3>\n<ul>");
        for method in &coverage.covered {
            let _ = writeln!(
                html,
                "<li>{} <span style=\"color: #666;\">({})</span></li>",
                encode_text(&method.id),
                tests_phrase(method.test_count)
            );
        }
        let _ = writeln!(html, "</ul>\n<h3>Not covered</h3>\n<ul>");
        for id in &coverage.not_covered {
            let _ = writeln!(html, "<li>{}</li>", encode_text(id));
        }
        let _ = writeln!(html, "</ul>\n</div>");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn badge(percentage: Percentage) -> String {
    format!(
        "<span style=\"background: {}; color: #fff; padding: 2px 8px; border-radius: 4px;\">{}</span>",
        CoverageTier::of(percentage).color(),
        percentage
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{analyze, PassedTest};

    fn report() -> CoverageReport {
        analyze(
            "Face.pushpull\nFace.explode\nEdge.length\nVertex.<=>\n",
            &[
                PassedTest::new("Face", "pushpull"),
                PassedTest::new("Edge", "length"),
                PassedTest::new("Edge", "length_after_split"),
            ],
        )
    }

    #[test]
    fn test_tiers() {
        assert_eq!(CoverageTier::of(Percentage::Defined(0.0)), CoverageTier::None);
        assert_eq!(CoverageTier::of(Percentage::Defined(42.0)), CoverageTier::Partial);
        assert_eq!(CoverageTier::of(Percentage::Defined(100.0)), CoverageTier::Full);
        assert_eq!(CoverageTier::of(Percentage::Undefined), CoverageTier::Undefined);
    }

    #[test]
    fn test_tests_phrase() {
        assert_eq!(tests_phrase(1), "1 test");
        assert_eq!(tests_phrase(2), "2 tests");
        assert_eq!(tests_phrase(0), "0 tests");
    }

    #[test]
    fn test_html_structure() {
        let html = render_coverage_html(&report());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Total coverage: "));
        assert!(html.contains("50.0%"));
        assert!(html.contains("Face.pushpull <span style=\"color: #666;\">(1 test)</span>"));
        assert!(html.contains("Edge.length <span style=\"color: #666;\">(2 tests)</span>"));
        assert!(html.contains("<li>Face.explode</li>"));
        assert!(!html.contains("<link"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_classes_sorted_alphabetically() {
        let html = render_coverage_html(&report());
        let edge = html.find("Edge</h2>").unwrap();
        let face = html.find("Face</h2>").unwrap();
        let vertex = html.find("Vertex</h2>").unwrap();
        assert!(edge < face && face < vertex);
    }

    #[test]
    fn test_method_names_are_escaped() {
        let html = render_coverage_html(&report());
        assert!(html.contains("Vertex.&lt;=&gt;"));
    }

    #[test]
    fn test_badge_colors_by_tier() {
        let html = render_coverage_html(&report());
        assert!(html.contains(CoverageTier::Full.color()));
        assert!(html.contains(CoverageTier::Partial.color()));
        assert!(html.contains(CoverageTier::None.color()));
    }
}
