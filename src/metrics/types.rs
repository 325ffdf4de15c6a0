//! @ai:module:intent Evaluation records and aggregate statistics
//! @ai:module:layer domain
//! @ai:module:public_api EvaluationResult, EvaluationStatus, AggregateStats, CategoryStats, ModelResults, EvaluationRun
//! @ai:module:stateless true

use crate::config::ModelConfig;
use crate::dataset::Complexity;
use crate::scorer::{Metric, ScoreBreakdown, ScoreReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// @ai:intent Outcome of one (model, test case) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    /// The model answered and the answer was scored (possibly as zero)
    Scored,
    /// The call failed; excluded from every aggregate
    Failed,
}

/// @ai:intent Record of one pair; written once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub model_id: String,
    pub model_short_name: String,
    pub test_case: String,
    pub category: Complexity,
    pub status: EvaluationStatus,
    #[serde(default)]
    pub report: Option<ScoreReport>,
    #[serde(default)]
    pub raw_output: String,
    #[serde(default)]
    pub parse_error: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
    pub cost_usd: f64,
    pub timestamp: String,
}

impl EvaluationResult {
    /// @ai:effects pure
    pub fn is_scored(&self) -> bool {
        self.status == EvaluationStatus::Scored
    }

    /// @ai:intent Score breakdown of a scored pair
    /// @ai:effects pure
    pub fn breakdown(&self) -> Option<&ScoreBreakdown> {
        self.report.as_ref().map(|r| &r.breakdown)
    }

    /// @ai:effects pure
    pub fn overall(&self) -> Option<f64> {
        self.breakdown().map(|b| b.overall)
    }
}

/// @ai:intent Aggregated statistics for one model over scored pairs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub case_count: u32,
    pub scored_count: u32,
    pub failed_count: u32,
    pub success_rate: f64,
    pub avg_overall: f64,
    pub avg_subscores: BTreeMap<Metric, f64>,
    pub avg_latency_ms: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub avg_input_tokens: f64,
    pub avg_output_tokens: f64,
    pub total_cost_usd: f64,
}

impl AggregateStats {
    /// @ai:intent Average sub-score, 0 when nothing was scored
    /// @ai:effects pure
    pub fn subscore(&self, metric: Metric) -> f64 {
        self.avg_subscores.get(&metric).copied().unwrap_or(0.0)
    }
}

/// @ai:intent Scored pair count and average score within one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Complexity,
    pub count: u32,
    pub avg_overall: f64,
}

/// @ai:intent Every result of one model plus its aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResults {
    pub model: ModelConfig,
    pub stats: AggregateStats,
    pub by_category: Vec<CategoryStats>,
    pub cost_per_1000_workflows: f64,
    pub results: Vec<EvaluationResult>,
}

/// @ai:intent A complete evaluation run across models and test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub timestamp: String,
    pub test_case_count: usize,
    #[serde(default)]
    pub dry_run: bool,
    pub models: Vec<ModelResults>,
}

impl EvaluationRun {
    /// @ai:intent Model with the highest average overall score among those with scored pairs
    /// @ai:effects pure
    pub fn best_model(&self) -> Option<&ModelResults> {
        self.models
            .iter()
            .filter(|m| m.stats.scored_count > 0)
            .max_by(|a, b| a.stats.avg_overall.total_cmp(&b.stats.avg_overall))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_results(short_name: &str, scored: u32, avg: f64) -> ModelResults {
        ModelResults {
            model: ModelConfig {
                short_name: short_name.to_string(),
                ..Default::default()
            },
            stats: AggregateStats {
                scored_count: scored,
                avg_overall: avg,
                ..Default::default()
            },
            by_category: vec![],
            cost_per_1000_workflows: 0.0,
            results: vec![],
        }
    }

    #[test]
    fn test_best_model_ignores_models_without_scores() {
        let run = EvaluationRun {
            timestamp: "20250101_000000".to_string(),
            test_case_count: 3,
            dry_run: false,
            models: vec![
                model_results("nova-lite", 3, 0.72),
                model_results("nova-pro", 3, 0.88),
                model_results("claude-3.5", 0, 0.0),
            ],
        };

        assert_eq!(run.best_model().unwrap().model.short_name, "nova-pro");
    }

    #[test]
    fn test_missing_subscore_is_zero() {
        assert_eq!(AggregateStats::default().subscore(Metric::KeyFormat), 0.0);
    }
}
