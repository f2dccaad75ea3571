use super::emit;
use crate::cli::{OutputFormat, Selection};
use crate::config::TestupConfig;
use crate::core::TestCategory;
use crate::session::SessionPlan;
use anyhow::Result;
use colored::*;

pub fn list_tests(config: &TestupConfig, selection: &Selection, format: OutputFormat) -> Result<()> {
    let mut plan = SessionPlan::from_config(config);
    if let Some(dir) = &selection.tests_dir {
        plan.tests_dir = dir.clone();
    }
    plan.category_filter = selection.category.clone();
    plan.unit_filter = selection.filter.clone();

    let categories = plan.discover()?;
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&categories)? + "\n",
        OutputFormat::Terminal | OutputFormat::Html => render_listing(&categories),
    };
    emit(&rendered, None)
}

pub fn render_listing(categories: &[TestCategory]) -> String {
    let mut out = String::new();
    let mut units = 0;
    for category in categories {
        out.push_str(&format!("{}\n", category.name.bold()));
        for file in &category.files {
            out.push_str(&format!("  {}\n", file.unit_name));
        }
        units += category.files.len();
    }
    out.push_str(&format!(
        "{} units in {} categories\n",
        units,
        categories.len()
    ));
    out
}
