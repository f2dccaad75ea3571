use super::summary::RunSummary;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

pub fn render_terminal(summary: &RunSummary) -> String {
    let mut out = String::new();
    let tally = &summary.tally;

    out.push_str(&format!("{}\n", "═══════════════════════════════════════════".cyan()));
    out.push_str(&format!("{}\n", "           TEST RESULTS".bold().cyan()));
    out.push_str(&format!("{}\n", "═══════════════════════════════════════════".cyan()));

    if let Some(dir) = &summary.run_dir {
        out.push_str(&format!("Results: {}\n", dir.display()));
    }

    if !summary.files.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Category", "Unit", "Pass", "Fail", "Error"]);
        for file in &summary.files {
            let color = match file.tally.status_class() {
                "pass" => Color::Green,
                "fail" => Color::Red,
                "warn" => Color::Yellow,
                _ => Color::Grey,
            };
            table.add_row(vec![
                Cell::new(&file.category),
                Cell::new(&file.unit_name).fg(color),
                Cell::new(file.tally.pass),
                Cell::new(file.tally.fail),
                Cell::new(file.tally.warn),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    for skipped in &summary.skipped {
        out.push_str(&format!(
            "{} {}: {}\n",
            "skipped".yellow(),
            skipped.unit_name,
            skipped.reason
        ));
    }

    let failures: Vec<&String> = summary.files.iter().flat_map(|f| &f.failures).collect();
    if !failures.is_empty() {
        out.push_str(&format!("\n{}\n", "Failures".bold().red()));
        for failure in failures {
            out.push_str(&format!("  - {}\n", failure));
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "{} tests: {} passed ({}), {} failed ({}), {} errors ({})\n",
        tally.total(),
        tally.pass.to_string().green(),
        summary.rates.pass,
        tally.fail.to_string().red(),
        summary.rates.fail,
        tally.warn.to_string().yellow(),
        summary.rates.warn
    ));
    out.push_str(&format!(
        "Sizes: {} small, {} medium, {} large\n",
        tally.small, tally.medium, tally.large
    ));

    if let Some(coverage) = &summary.coverage {
        out.push_str(&format!(
            "API coverage: {} ({} of {} methods) -> {}\n",
            coverage.total.to_string().bold(),
            coverage.covered_methods,
            coverage.total_methods,
            coverage.report_path.display()
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ResultParser;

    #[test]
    fn test_terminal_lists_units_and_failures() {
        let report = ResultParser::new("rb")
            .parse_output("Loaded suite TC_Face\ntest_area(TC_Face): .\ntest_cut(TC_Face): E\n");
        let mut summary = RunSummary::new(None);
        summary.add_file("Face", "TC_Face", "TC_Face.rb".into(), &report);
        summary.skip("TC_Broken", "syntax error");

        let out = render_terminal(&summary);
        assert!(out.contains("TC_Face"));
        assert!(out.contains("test_cut(TC_Face)"));
        assert!(out.contains("TC_Broken: syntax error"));
        assert!(out.contains("2 tests"));
        assert!(out.contains("Sizes: 2 small, 0 medium, 0 large"));
    }
}
