//! Run summary formatting.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use refcheck::RunSummary;

/// Formats comparison run summaries for output.
pub struct SummaryReport;

impl SummaryReport {
    /// Format the totals and every non-identical pair as a console table.
    pub fn format_table(summary: &RunSummary) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["Reference Comparison", ""]);

        table.add_row(vec!["Source:", &summary.source_root.display().to_string()]);
        table.add_row(vec!["Target:", &summary.target_root.display().to_string()]);
        table.add_row(vec![
            "Duration:",
            &format!(
                "{:.1}s",
                (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0
            ),
        ]);

        table.add_row(vec!["", ""]);
        table.add_row(vec!["Compared:", &summary.compared.to_string()]);
        table.add_row(vec!["Same:", &summary.same.to_string()]);
        table.add_row(vec!["Different:", &summary.different.to_string()]);
        table.add_row(vec!["Only in source:", &summary.source_only.len().to_string()]);
        table.add_row(vec!["Only in target:", &summary.target_only.len().to_string()]);

        let different: Vec<_> = summary.results.iter().filter(|r| !r.is_same()).collect();
        if !different.is_empty() {
            table.add_row(vec!["", ""]);
            for result in different {
                let findings: Vec<String> =
                    result.discrepancies.iter().map(|d| d.to_string()).collect();
                table.add_row(vec![result.source.display().to_string(), findings.join("\n")]);
            }
        }

        table.to_string()
    }

    /// Format the summary as JSON.
    pub fn format_json(summary: &RunSummary) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}
