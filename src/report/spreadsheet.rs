//! @ai:module:intent CSV spreadsheets comparing models, categories and individual pairs
//! @ai:module:layer infrastructure
//! @ai:module:public_api SpreadsheetReporter, SpreadsheetReporterTrait
//! @ai:module:stateless true

use crate::metrics::{EvaluationRun, EvaluationStatus};
use crate::scorer::Metric;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ModelComparisonRow<'a> {
    model: &'a str,
    model_id: &'a str,
    overall_score: String,
    selector_accuracy: String,
    drag_parameters: String,
    element_extraction: String,
    key_format: String,
    action_grouping: String,
    success_rate: String,
    avg_latency_s: String,
    cost_per_1000_workflows_usd: String,
}

#[derive(Debug, Serialize)]
struct CategoryRow<'a> {
    model: &'a str,
    category: &'a str,
    scored_cases: u32,
    avg_score: String,
}

#[derive(Debug, Serialize)]
struct CaseRow<'a> {
    model: &'a str,
    test_case: &'a str,
    category: &'a str,
    status: &'a str,
    overall_score: String,
    grade: String,
    latency_ms: u64,
    input_tokens: u32,
    output_tokens: u32,
    cost_usd: String,
    error: &'a str,
}

/// @ai:intent Trait for spreadsheet generation
pub trait SpreadsheetReporterTrait: Send + Sync {
    /// @ai:intent Write every spreadsheet; returns the file names written
    fn generate_all(&self, run: &EvaluationRun, output_dir: &Path) -> Result<Vec<String>>;
}

/// @ai:intent Writes CSV spreadsheets
pub struct SpreadsheetReporter;

impl SpreadsheetReporter {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Serialize rows to a CSV file with a header line
    /// @ai:effects fs:write
    fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        for row in rows {
            writer.serialize(row)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// @ai:intent One row per model: overall score, sub-scores, success rate, latency, cost
    /// @ai:effects fs:write
    pub fn write_model_comparison(&self, run: &EvaluationRun, path: &Path) -> Result<()> {
        let rows = run.models.iter().map(|m| {
            let stats = &m.stats;
            ModelComparisonRow {
                model: &m.model.name,
                model_id: &m.model.id,
                overall_score: percent(stats.avg_overall),
                selector_accuracy: percent(stats.subscore(Metric::SelectorAccuracy)),
                drag_parameters: percent(stats.subscore(Metric::DragParameters)),
                element_extraction: percent(stats.subscore(Metric::ElementExtraction)),
                key_format: percent(stats.subscore(Metric::KeyFormat)),
                action_grouping: percent(stats.subscore(Metric::ActionGrouping)),
                success_rate: percent(stats.success_rate),
                avg_latency_s: format!("{:.2}", stats.avg_latency_ms / 1000.0),
                cost_per_1000_workflows_usd: format!("{:.2}", m.cost_per_1000_workflows),
            }
        });

        Self::write_rows(path, rows)
    }

    /// @ai:intent One row per model and category
    /// @ai:effects fs:write
    pub fn write_category_breakdown(&self, run: &EvaluationRun, path: &Path) -> Result<()> {
        let rows = run.models.iter().flat_map(|m| {
            m.by_category.iter().map(move |c| CategoryRow {
                model: &m.model.name,
                category: c.category.label(),
                scored_cases: c.count,
                avg_score: percent(c.avg_overall),
            })
        });

        Self::write_rows(path, rows)
    }

    /// @ai:intent One row per (model, test case) pair
    /// @ai:effects fs:write
    pub fn write_case_results(&self, run: &EvaluationRun, path: &Path) -> Result<()> {
        let rows = run.models.iter().flat_map(|m| {
            m.results.iter().map(move |r| CaseRow {
                model: &m.model.short_name,
                test_case: &r.test_case,
                category: r.category.as_str(),
                status: match r.status {
                    EvaluationStatus::Scored => "scored",
                    EvaluationStatus::Failed => "failed",
                },
                overall_score: r.overall().map(|s| format!("{:.3}", s)).unwrap_or_default(),
                grade: r
                    .report
                    .as_ref()
                    .map(|rep| rep.grade.to_string())
                    .unwrap_or_default(),
                latency_ms: r.latency_ms,
                input_tokens: r.input_tokens,
                output_tokens: r.output_tokens,
                cost_usd: format!("{:.6}", r.cost_usd),
                error: r
                    .error
                    .as_deref()
                    .or(r.parse_error.as_deref())
                    .unwrap_or(""),
            })
        });

        Self::write_rows(path, rows)
    }
}

impl Default for SpreadsheetReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetReporterTrait for SpreadsheetReporter {
    /// @ai:effects fs:write
    fn generate_all(&self, run: &EvaluationRun, output_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(output_dir)?;

        self.write_model_comparison(run, &output_dir.join("model_comparison.csv"))?;
        self.write_category_breakdown(run, &output_dir.join("category_breakdown.csv"))?;
        self.write_case_results(run, &output_dir.join("case_results.csv"))?;

        Ok(vec![
            "model_comparison.csv".to_string(),
            "category_breakdown.csv".to_string(),
            "case_results.csv".to_string(),
        ])
    }
}

/// @ai:effects pure
fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}
