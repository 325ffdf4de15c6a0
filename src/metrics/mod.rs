//! @ai:module:intent Evaluation records, aggregation and cost estimation
//! @ai:module:layer application
//! @ai:module:public_api EvaluationResult, EvaluationRun, ModelResults, AggregateStats, MetricsAggregator

pub mod aggregator;
pub mod cost;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use cost::{call_cost, cost_per_1000_workflows};
pub use types::{
    AggregateStats, CategoryStats, EvaluationResult, EvaluationRun, EvaluationStatus,
    ModelResults,
};
