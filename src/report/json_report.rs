//! @ai:module:intent JSON persistence of evaluation runs and the analysis summary
//! @ai:module:layer infrastructure
//! @ai:module:public_api Analysis, ModelSummary, ThresholdCompliance, JsonReporter, ResultStore
//! @ai:module:stateless true

use crate::config::QualityThresholds;
use crate::metrics::{AggregateStats, EvaluationRun, ModelResults};
use crate::scorer::{Grade, Metric};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const RUN_FILE_PREFIX: &str = "complete_evaluation_";

/// @ai:intent Which quality targets a model meets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdCompliance {
    pub selector_accuracy: bool,
    pub element_extraction: bool,
    pub overall_quality: bool,
}

impl ThresholdCompliance {
    /// @ai:effects pure
    pub fn evaluate(stats: &AggregateStats, thresholds: &QualityThresholds) -> Self {
        Self {
            selector_accuracy: stats.subscore(Metric::SelectorAccuracy)
                >= thresholds.min_selector_accuracy,
            element_extraction: stats.subscore(Metric::ElementExtraction)
                >= thresholds.min_element_extraction,
            overall_quality: stats.avg_overall >= thresholds.min_overall_quality,
        }
    }

    /// @ai:effects pure
    pub fn all_met(&self) -> bool {
        self.selector_accuracy && self.element_extraction && self.overall_quality
    }
}

/// @ai:intent Aggregate view of one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_id: String,
    pub name: String,
    pub short_name: String,
    pub avg_overall: f64,
    pub grade: Grade,
    pub subscores: BTreeMap<Metric, f64>,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub cost_per_1000_workflows: f64,
    pub total_cost_usd: f64,
    pub compliance: ThresholdCompliance,
}

impl ModelSummary {
    /// @ai:effects pure
    pub fn from_results(results: &ModelResults, thresholds: &QualityThresholds) -> Self {
        let stats = &results.stats;

        Self {
            model_id: results.model.id.clone(),
            name: results.model.name.clone(),
            short_name: results.model.short_name.clone(),
            avg_overall: stats.avg_overall,
            grade: Grade::from_score(stats.avg_overall),
            subscores: stats.avg_subscores.clone(),
            success_rate: stats.success_rate,
            avg_latency_ms: stats.avg_latency_ms,
            cost_per_1000_workflows: results.cost_per_1000_workflows,
            total_cost_usd: stats.total_cost_usd,
            compliance: ThresholdCompliance::evaluate(stats, thresholds),
        }
    }
}

/// @ai:intent Content of analysis.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub evaluation_timestamp: String,
    pub test_case_count: usize,
    pub dry_run: bool,
    pub recommended_model: Option<String>,
    pub thresholds: QualityThresholds,
    pub models: Vec<ModelSummary>,
}

impl Analysis {
    /// @ai:intent Summarize a run against the quality thresholds
    /// @ai:effects pure
    pub fn build(run: &EvaluationRun, thresholds: &QualityThresholds) -> Self {
        Self {
            evaluation_timestamp: run.timestamp.clone(),
            test_case_count: run.test_case_count,
            dry_run: run.dry_run,
            recommended_model: run.best_model().map(|m| m.model.short_name.clone()),
            thresholds: thresholds.clone(),
            models: run
                .models
                .iter()
                .map(|m| ModelSummary::from_results(m, thresholds))
                .collect(),
        }
    }
}

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Write analysis.json
    fn generate(&self, analysis: &Analysis, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes the analysis summary
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:effects fs:write
    fn generate(&self, analysis: &Analysis, output_path: &Path) -> Result<()> {
        write_json_atomic(output_path, analysis)
    }
}

/// @ai:intent Write JSON through a temp file in the same directory, then rename
/// @ai:effects fs:write
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// @ai:intent Saves and loads evaluation runs in the results directory
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    /// @ai:effects pure
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// @ai:effects pure
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// @ai:intent Persist one model's results as `<short_name>_results.json`
    /// @ai:effects fs:write
    pub fn save_model(&self, results: &ModelResults) -> Result<PathBuf> {
        let path = self
            .results_dir
            .join(format!("{}_results.json", results.model.short_name));
        write_json_atomic(&path, results)?;
        tracing::info!("Saved {} results to {}", results.model.short_name, path.display());
        Ok(path)
    }

    /// @ai:intent Persist a run as `complete_evaluation_<timestamp>.json` plus per-model files
    /// @ai:effects fs:write
    pub fn save_run(&self, run: &EvaluationRun) -> Result<PathBuf> {
        for model in &run.models {
            self.save_model(model)?;
        }

        let path = self
            .results_dir
            .join(format!("{}{}.json", RUN_FILE_PREFIX, run.timestamp));
        write_json_atomic(&path, run)?;
        tracing::info!("Saved complete evaluation to {}", path.display());
        Ok(path)
    }

    /// @ai:intent Load a run file
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<EvaluationRun> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid run file {}", path.display()))
    }

    /// @ai:intent Path of the most recent run file; timestamps sort lexicographically
    /// @ai:effects fs:read
    pub fn latest_run_path(&self) -> Option<PathBuf> {
        WalkDir::new(&self.results_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                name.starts_with(RUN_FILE_PREFIX) && name.ends_with(".json")
            })
            .map(|e| e.path().to_path_buf())
            .max()
    }

    /// @ai:intent Load the most recent run
    /// @ai:effects fs:read
    pub fn load_latest(&self) -> Result<EvaluationRun> {
        let path = self.latest_run_path().with_context(|| {
            format!("No evaluation results found in {}", self.results_dir.display())
        })?;
        tracing::info!("Loading results from {}", path.display());
        Self::load(&path)
    }
}
