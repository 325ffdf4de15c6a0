//! @ai:module:intent Report generation for evaluation runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, ResultStore, Analysis, SpreadsheetReporter, ChartGenerator, DecisionReporter

pub mod charts;
pub mod decision_report;
pub mod json_report;
pub mod spreadsheet;

pub use charts::{ChartGenerator, ChartGeneratorTrait};
pub use decision_report::{DecisionReporter, DecisionReporterTrait};
pub use json_report::{
    write_json_atomic, Analysis, JsonReporter, JsonReporterTrait, ModelSummary, ResultStore,
    ThresholdCompliance,
};
pub use spreadsheet::{SpreadsheetReporter, SpreadsheetReporterTrait};

use crate::config::QualityThresholds;
use crate::metrics::EvaluationRun;
use anyhow::Result;
use std::path::Path;

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    spreadsheets: SpreadsheetReporter,
    charts: ChartGenerator,
    decision: DecisionReporter,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            spreadsheets: SpreadsheetReporter::new(),
            charts: ChartGenerator::new(),
            decision: DecisionReporter::new(),
        }
    }

    /// @ai:intent Generate every report; returns the analysis and the file names written
    /// @ai:effects fs:write
    pub fn generate_all(
        &self,
        run: &EvaluationRun,
        thresholds: &QualityThresholds,
        output_dir: &Path,
    ) -> Result<(Analysis, Vec<String>)> {
        std::fs::create_dir_all(output_dir)?;

        let analysis = Analysis::build(run, thresholds);
        let mut files = Vec::new();

        self.json.generate(&analysis, &output_dir.join("analysis.json"))?;
        files.push("analysis.json".to_string());

        files.extend(self.spreadsheets.generate_all(run, output_dir)?);
        files.extend(
            self.charts
                .generate_all(run, thresholds.min_overall_quality, output_dir)?,
        );

        self.decision
            .generate(&analysis, &output_dir.join("decision_report.md"))?;
        files.push("decision_report.md".to_string());

        tracing::info!("Reports generated in {}", output_dir.display());
        Ok((analysis, files))
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
