//! Static results page.
//!
//! One self-contained document: totals and rates, size breakdown, a link to
//! the coverage report, then each file's transcript with status lines,
//! failure locations and failure messages highlighted. Discarded lines are
//! left out.

use super::summary::{FileSummary, RunSummary};
use crate::parser::{LineKind, ParsedLine, ParsedReport};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::collections::BTreeMap;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
pre{background:#f7f7f7;padding:1em;overflow-x:auto}\
.pass{color:#3c763d}.fail{color:#a94442}.warn{color:#8a6d3b}\
.location{font-weight:bold}.failure-message{background:#f2dede}\
.intro{color:#555}table.totals td{padding:0 1em 0 0}";

pub struct ResultsPage<'a> {
    pub summary: &'a RunSummary,
    /// Parsed transcripts, in the same order as `summary.files`
    pub reports: &'a [ParsedReport],
    /// Category name to intro HTML
    pub intros: &'a BTreeMap<String, String>,
}

impl ResultsPage<'_> {
    pub fn render(&self) -> String {
        let summary = self.summary;
        let tally = &summary.tally;
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>Test Results</title>\n");
        let _ = writeln!(html, "<style>{}</style>", STYLE);
        html.push_str("</head>\n<body>\n<h1>Test Results</h1>\n");

        html.push_str("<table class=\"totals\" id=\"summary\">\n");
        let rows = [
            ("Tests", tally.total().to_string()),
            ("Passed", format!("{} ({})", tally.pass, summary.rates.pass)),
            ("Failed", format!("{} ({})", tally.fail, summary.rates.fail)),
            ("Errors", format!("{} ({})", tally.warn, summary.rates.warn)),
            (
                "Sizes",
                format!(
                    "{} small, {} medium, {} large",
                    tally.small, tally.medium, tally.large
                ),
            ),
        ];
        for (label, value) in rows {
            let _ = writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", label, value);
        }
        html.push_str("</table>\n");

        if let Some(coverage) = &summary.coverage {
            let href = coverage.report_path.to_string_lossy();
            let _ = writeln!(
                html,
                "<p>API coverage: <a href=\"{}\">{}</a> ({} of {} methods)</p>",
                encode_double_quoted_attribute(&href),
                coverage.total,
                coverage.covered_methods,
                coverage.total_methods
            );
        }

        if !summary.skipped.is_empty() {
            html.push_str("<h2>Skipped</h2>\n<ul>\n");
            for skipped in &summary.skipped {
                let _ = writeln!(
                    html,
                    "<li>{}: {}</li>",
                    encode_text(&skipped.unit_name),
                    encode_text(&skipped.reason)
                );
            }
            html.push_str("</ul>\n");
        }

        let mut last_category: Option<&str> = None;
        for (file, report) in summary.files.iter().zip(self.reports) {
            if last_category != Some(file.category.as_str()) {
                let _ = writeln!(html, "<h2>{}</h2>", encode_text(&file.category));
                if let Some(intro) = self.intros.get(&file.category) {
                    // Intro sidecars are authored HTML
                    let _ = writeln!(html, "<div class=\"intro\">{}</div>", intro);
                }
                last_category = Some(file.category.as_str());
            }
            render_file(&mut html, file, report);
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

fn render_file(html: &mut String, file: &FileSummary, report: &ParsedReport) {
    let _ = writeln!(
        html,
        "<h3 id=\"{}\" class=\"{}\">{} <small>{}</small></h3>",
        encode_double_quoted_attribute(&file.element_id),
        file.tally.status_class(),
        encode_text(&file.unit_name),
        super::summary::counts_text(&file.tally)
    );
    html.push_str("<pre>");
    for line in &report.lines {
        if let Some(rendered) = render_line(line) {
            html.push_str(&rendered);
            html.push('\n');
        }
    }
    html.push_str("</pre>\n");
}

fn render_line(line: &ParsedLine) -> Option<String> {
    let text = encode_text(&line.text);
    let class = match &line.kind {
        LineKind::Discarded => return None,
        LineKind::Status(result) => result.status.as_str(),
        LineKind::Location => "location",
        LineKind::FailureMessage => "failure-message",
        LineKind::SuiteHeader(_) | LineKind::Text => return Some(text.into_owned()),
    };
    Some(format!("<span class=\"{}\">{}</span>", class, text))
}
