//! @ai:module:intent Model evaluation harness for UI-automation workflow generation
//! @ai:module:layer application
//! @ai:module:public_api access, config, dataset, error, metrics, report, runner, scorer

pub mod access;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scorer;

pub use access::{AccessReport, AccessStatus, ModelAccessChecker};
pub use config::EvalConfig;
pub use dataset::{Complexity, DatasetRegistry, DatasetRegistryTrait, TestCase};
pub use error::{EvalError, Result};
pub use metrics::{EvaluationResult, EvaluationRun, MetricsAggregator, ModelResults};
pub use report::{Analysis, ReportGenerator, ResultStore};
pub use runner::{BedrockClient, EvaluationExecutor, InferenceClientTrait, MockInferenceClient};
pub use scorer::{QualityScorer, QualityScorerTrait, ScoreBreakdown, ScoreReport};
