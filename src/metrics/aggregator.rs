//! @ai:module:intent Statistical aggregation of evaluation results
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator, MetricsAggregatorTrait
//! @ai:module:stateless true

use crate::config::ModelConfig;
use crate::dataset::Complexity;
use crate::metrics::cost::cost_per_1000_workflows;
use crate::metrics::types::{AggregateStats, CategoryStats, EvaluationResult, EvaluationStatus, ModelResults};
use crate::scorer::Metric;

/// @ai:intent Trait for metrics aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Aggregate one model's results
    fn aggregate(&self, model: &ModelConfig, results: Vec<EvaluationResult>) -> ModelResults;
}

/// @ai:intent Aggregates per-pair results into per-model summaries
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Aggregate stats; failed pairs only count toward the success rate
    /// @ai:effects pure
    pub fn calculate_aggregate(results: &[EvaluationResult]) -> AggregateStats {
        if results.is_empty() {
            return AggregateStats::default();
        }

        let scored: Vec<_> = results.iter().filter(|r| r.is_scored()).collect();
        let case_count = results.len() as u32;
        let scored_count = scored.len() as u32;
        let failed_count = results
            .iter()
            .filter(|r| r.status == EvaluationStatus::Failed)
            .count() as u32;

        let avg_subscores = Metric::ALL
            .iter()
            .map(|m| {
                let avg = average(scored.iter().filter_map(|r| r.breakdown()).map(|b| b.get(*m)));
                (*m, avg)
            })
            .collect();

        let total_input_tokens: u64 = scored.iter().map(|r| u64::from(r.input_tokens)).sum();
        let total_output_tokens: u64 = scored.iter().map(|r| u64::from(r.output_tokens)).sum();

        AggregateStats {
            case_count,
            scored_count,
            failed_count,
            success_rate: f64::from(scored_count) / f64::from(case_count),
            avg_overall: average(scored.iter().filter_map(|r| r.overall())),
            avg_subscores,
            avg_latency_ms: average(scored.iter().map(|r| r.latency_ms as f64)),
            total_input_tokens,
            total_output_tokens,
            avg_input_tokens: average(scored.iter().map(|r| f64::from(r.input_tokens))),
            avg_output_tokens: average(scored.iter().map(|r| f64::from(r.output_tokens))),
            total_cost_usd: scored.iter().map(|r| r.cost_usd).sum(),
        }
    }

    /// @ai:intent Scored pair count and average score per category, every category listed
    /// @ai:effects pure
    fn aggregate_by_category(results: &[EvaluationResult]) -> Vec<CategoryStats> {
        Complexity::ALL
            .iter()
            .map(|category| {
                let scores: Vec<f64> = results
                    .iter()
                    .filter(|r| r.category == *category)
                    .filter_map(|r| r.overall())
                    .collect();

                CategoryStats {
                    category: *category,
                    count: scores.len() as u32,
                    avg_overall: average(scores.into_iter()),
                }
            })
            .collect()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// @ai:intent Calculate average of an iterator of f64
/// @ai:effects pure
fn average<I: Iterator<Item = f64>>(iter: I) -> f64 {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:effects pure
    fn aggregate(&self, model: &ModelConfig, results: Vec<EvaluationResult>) -> ModelResults {
        let stats = Self::calculate_aggregate(&results);
        let by_category = Self::aggregate_by_category(&results);

        ModelResults {
            cost_per_1000_workflows: cost_per_1000_workflows(model, &stats),
            model: model.clone(),
            stats,
            by_category,
            results,
        }
    }
}
