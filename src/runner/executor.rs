//! @ai:module:intent Evaluation loop: every selected model on every test case
//! @ai:module:layer application
//! @ai:module:public_api EvaluationExecutor, PreparedCase
//! @ai:module:stateless false

use crate::config::ModelConfig;
use crate::dataset::{RecordedSession, TestCase};
use crate::metrics::{
    call_cost, EvaluationResult, EvaluationRun, EvaluationStatus, MetricsAggregator,
    MetricsAggregatorTrait, ModelResults,
};
use crate::runner::client::InferenceClientTrait;
use crate::runner::prompt::build_generation_prompt;
use crate::scorer::{QualityScorer, QualityScorerTrait, SessionElements};
use std::sync::Arc;
use std::time::Instant;

/// @ai:intent A test case with its prompt and reference element names ready
#[derive(Debug, Clone)]
pub struct PreparedCase {
    pub case: TestCase,
    pub prompt: String,
    pub elements: SessionElements,
}

impl PreparedCase {
    /// @ai:intent Load the session and build the generation prompt
    /// @ai:effects fs:read
    pub fn load(case: &TestCase) -> anyhow::Result<Self> {
        let session = RecordedSession::load(&case.session_path)?;
        let prompt = build_generation_prompt(&session.to_timeline())?;

        Ok(Self {
            case: case.clone(),
            prompt,
            elements: SessionElements::from_session(&session),
        })
    }
}

/// @ai:intent Runs models against test cases one call at a time
pub struct EvaluationExecutor<C: InferenceClientTrait> {
    client: Arc<C>,
    scorer: QualityScorer,
    aggregator: MetricsAggregator,
    dry_run: bool,
}

impl<C: InferenceClientTrait> EvaluationExecutor<C> {
    /// @ai:intent Create a new evaluation executor
    /// @ai:effects pure
    pub fn new(client: Arc<C>, dry_run: bool) -> Self {
        Self {
            client,
            scorer: QualityScorer::new(),
            aggregator: MetricsAggregator::new(),
            dry_run,
        }
    }

    /// @ai:intent Prepare every case; unreadable sessions are warned about and skipped
    /// @ai:effects fs:read
    pub fn prepare_cases(cases: &[TestCase]) -> Vec<PreparedCase> {
        cases
            .iter()
            .filter_map(|case| match PreparedCase::load(case) {
                Ok(prepared) => Some(prepared),
                Err(e) => {
                    tracing::warn!("Skipping test case {}: {:#}", case.id(), e);
                    None
                }
            })
            .collect()
    }

    /// @ai:intent Evaluate one (model, case) pair; call failures become failed records
    /// @ai:effects network
    pub async fn evaluate_pair(&self, model: &ModelConfig, prepared: &PreparedCase) -> EvaluationResult {
        let start = Instant::now();
        let outcome = self.client.generate(&prepared.prompt, &model.id).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let mut result = EvaluationResult {
            model_id: model.id.clone(),
            model_short_name: model.short_name.clone(),
            test_case: prepared.case.id(),
            category: prepared.case.category,
            status: EvaluationStatus::Failed,
            report: None,
            raw_output: String::new(),
            parse_error: None,
            error: None,
            input_tokens: 0,
            output_tokens: 0,
            latency_ms,
            cost_usd: 0.0,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        match outcome {
            Ok(completion) => {
                let scored = self
                    .scorer
                    .score_output(&completion.text, Some(&prepared.elements));

                tracing::info!(
                    "{} on {}: score {:.2} ({}) in {} ms",
                    model.short_name,
                    result.test_case,
                    scored.report.breakdown.overall,
                    scored.report.grade,
                    latency_ms
                );

                result.status = EvaluationStatus::Scored;
                result.report = Some(scored.report);
                result.parse_error = scored.parse_error;
                result.cost_usd = call_cost(model, completion.input_tokens, completion.output_tokens);
                result.input_tokens = completion.input_tokens;
                result.output_tokens = completion.output_tokens;
                result.raw_output = completion.text;
            }
            Err(e) => {
                tracing::error!("{} on {} failed: {}", model.short_name, result.test_case, e);
                result.error = Some(e.to_string());
            }
        }

        result
    }

    /// @ai:intent Evaluate one model on every prepared case
    /// @ai:effects network
    pub async fn evaluate_model(&self, model: &ModelConfig, cases: &[PreparedCase]) -> ModelResults {
        tracing::info!("Evaluating {} on {} test cases", model.name, cases.len());

        let mut results = Vec::with_capacity(cases.len());
        for prepared in cases {
            results.push(self.evaluate_pair(model, prepared).await);
        }

        let aggregated = self.aggregator.aggregate(model, results);
        tracing::info!(
            "{}: avg score {:.3}, success rate {:.0}%",
            model.short_name,
            aggregated.stats.avg_overall,
            aggregated.stats.success_rate * 100.0
        );

        aggregated
    }

    /// @ai:intent Evaluate every model on every test case, sequentially
    /// @ai:effects fs:read, network
    pub async fn execute_all(&self, models: &[ModelConfig], cases: &[TestCase]) -> EvaluationRun {
        let prepared = Self::prepare_cases(cases);

        let mut model_results = Vec::with_capacity(models.len());
        for model in models {
            model_results.push(self.evaluate_model(model, &prepared).await);
        }

        EvaluationRun {
            timestamp: chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            test_case_count: prepared.len(),
            dry_run: self.dry_run,
            models: model_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Complexity;
    use crate::runner::client::MockInferenceClient;
    use std::path::Path;
    use tempfile::TempDir;

    const SESSION: &str = r#"{
        "metadata": { "startTimeSeconds": 7 },
        "actions": [
            { "command": "CLICK", "timestamp": "2024-11-02T17:56:47Z",
              "element": { "name": "Play" }, "parameters": { "x": 10, "y": 20 } }
        ]
    }"#;

    const WORKFLOW: &str = r#"```json
{"steps": [{"action": "CLICK", "selector": {"type": "text", "value": "Play"}}]}
```"#;

    fn write_case(dir: &Path, category: Complexity, name: &str, content: &str) -> TestCase {
        let path = dir.join(format!("{}.json", name));
        std::fs::write(&path, content).unwrap();
        TestCase {
            category,
            name: name.to_string(),
            session_path: path,
        }
    }

    fn model(short_name: &str) -> ModelConfig {
        ModelConfig {
            id: format!("vendor.{}", short_name),
            name: short_name.to_string(),
            short_name: short_name.to_string(),
            input_price_per_1k: 0.001,
            output_price_per_1k: 0.002,
        }
    }

    #[tokio::test]
    async fn test_every_model_sees_every_case() {
        let temp = TempDir::new().unwrap();
        let cases = vec![
            write_case(temp.path(), Complexity::Simple, "play", SESSION),
            write_case(temp.path(), Complexity::Medium, "play_again", SESSION),
        ];

        let executor = EvaluationExecutor::new(Arc::new(MockInferenceClient::new(WORKFLOW)), false);
        let run = executor.execute_all(&[model("a"), model("b")], &cases).await;

        assert_eq!(run.test_case_count, 2);
        assert_eq!(run.models.len(), 2);
        for model_results in &run.models {
            assert_eq!(model_results.results.len(), 2);
            assert_eq!(model_results.stats.avg_overall, 1.0);
            // 5000 * 0.001 / 1000 + 3000 * 0.002 / 1000
            assert!((model_results.results[0].cost_usd - 0.011).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_malformed_sessions_are_skipped() {
        let temp = TempDir::new().unwrap();
        let cases = vec![
            write_case(temp.path(), Complexity::Simple, "good", SESSION),
            write_case(temp.path(), Complexity::Simple, "broken", "{ not json"),
        ];

        let executor = EvaluationExecutor::new(Arc::new(MockInferenceClient::new(WORKFLOW)), false);
        let run = executor.execute_all(&[model("a")], &cases).await;

        assert_eq!(run.test_case_count, 1);
        assert_eq!(run.models[0].results[0].test_case, "simple/good");
    }

    #[tokio::test]
    async fn test_call_failure_marks_pair_failed() {
        let temp = TempDir::new().unwrap();
        let cases = vec![write_case(temp.path(), Complexity::Complex, "play", SESSION)];

        let client = MockInferenceClient::failing(403, "AccessDeniedException");
        let executor = EvaluationExecutor::new(Arc::new(client), false);
        let run = executor.execute_all(&[model("a")], &cases).await;

        let results = &run.models[0];
        assert_eq!(results.results[0].status, EvaluationStatus::Failed);
        assert!(results.results[0].report.is_none());
        assert_eq!(results.stats.scored_count, 0);
        assert_eq!(results.stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_unparseable_output_is_scored_zero() {
        let temp = TempDir::new().unwrap();
        let cases = vec![write_case(temp.path(), Complexity::Simple, "play", SESSION)];

        let client = MockInferenceClient::new("I would click the play button.");
        let executor = EvaluationExecutor::new(Arc::new(client), true);
        let run = executor.execute_all(&[model("a")], &cases).await;

        let result = &run.models[0].results[0];
        assert!(run.dry_run);
        assert_eq!(result.status, EvaluationStatus::Scored);
        assert_eq!(result.overall(), Some(0.0));
        assert!(result.parse_error.is_some());
    }
}
