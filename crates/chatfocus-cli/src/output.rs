//! Result rendering

use crate::error::CliResult;
use chatfocus::SuiteResults;
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Output format for suite results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Render `results` in `format`
pub fn render(results: &SuiteResults, format: OutputFormat, use_color: bool) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(results, use_color)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
    }
}

/// Render a scenario-per-line report with a summary line
#[must_use]
pub fn render_text(results: &SuiteResults, use_color: bool) -> String {
    let mut out = String::new();
    for result in &results.results {
        let ms = result.duration.as_millis();
        if result.passed {
            let tag = style("PASS").green().bold().force_styling(use_color);
            let _ = writeln!(out, "{tag} {} ({ms}ms)", result.name);
        } else {
            let tag = style("FAIL").red().bold().force_styling(use_color);
            let _ = writeln!(out, "{tag} {} ({ms}ms)", result.name);
            if let Some(error) = &result.error {
                let _ = writeln!(out, "     {}", style(error).red().force_styling(use_color));
            }
        }
        for record in result.assertions.iter().filter(|r| !r.passed) {
            let _ = writeln!(out, "     - {}", record.message);
        }
    }

    let summary = format!(
        "{}: {} passed, {} failed",
        results.suite_name,
        results.passed_count(),
        results.failed_count()
    );
    let summary = if results.all_passed() {
        style(summary).green()
    } else {
        style(summary).red()
    };
    let _ = writeln!(out, "\n{}", summary.force_styling(use_color));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chatfocus::{AssertionRecord, TestResult};
    use std::time::Duration;

    fn results() -> SuiteResults {
        SuiteResults {
            suite_name: "chat window focus".to_string(),
            results: vec![
                TestResult::pass("focus_when_via_user").with_duration(Duration::from_millis(12)),
                TestResult::fail(
                    "no_focus_when_via_sidebar_message",
                    "Assertion failed: tab should still be focused",
                )
                .with_assertions(vec![AssertionRecord {
                    passed: false,
                    message: "tab should still be focused".to_string(),
                }]),
            ],
            duration: Duration::from_millis(40),
        }
    }

    #[test]
    fn test_text_without_color() {
        let text = render_text(&results(), false);
        assert!(text.contains("PASS focus_when_via_user (12ms)"));
        assert!(text.contains("FAIL no_focus_when_via_sidebar_message"));
        assert!(text.contains("- tab should still be focused"));
        assert!(text.trim_end().ends_with("chat window focus: 1 passed, 1 failed"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_text_with_color_has_escapes() {
        assert!(render_text(&results(), true).contains('\u{1b}'));
    }

    #[test]
    fn test_json_round_trips_counts() {
        let json = render(&results(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["results"][1]["passed"], serde_json::json!(false));
    }
}
