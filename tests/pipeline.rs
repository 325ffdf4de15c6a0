use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;
use workflow_eval::config::{ModelConfig, QualityThresholds};
use workflow_eval::dataset::{Complexity, DatasetRegistry, DatasetRegistryTrait};
use workflow_eval::metrics::EvaluationStatus;
use workflow_eval::report::{ReportGenerator, ResultStore};
use workflow_eval::runner::{EvaluationExecutor, MockInferenceClient};

const SESSION: &str = r#"{
    "metadata": { "startTimeSeconds": 12 },
    "actions": [
        { "command": "CLICK", "timestamp": "2024-11-02T17:56:47Z",
          "element": { "name": "Search" }, "parameters": { "x": 640, "y": 80 } },
        { "command": "TYPE", "timestamp": "2024-11-02T17:56:49Z",
          "parameters": { "text": "lofi beats" } },
        { "command": "PRESS", "timestamp": "2024-11-02T17:56:50Z",
          "parameters": { "key": "Enter" } }
    ]
}"#;

const RESPONSE: &str = r#"Here is the workflow:
```json
{
  "steps": [
    {"action": "CLICK", "selector": {"type": "text", "value": "Search"}},
    {"action": "TYPE_TEXT", "parameters": {"text": "lofi beats", "field": "Search"}},
    {"action": "PRESS_KEY", "parameters": {"key": "Enter"}}
  ]
}
```"#;

fn model(short_name: &str, input_price: f64, output_price: f64) -> ModelConfig {
    ModelConfig {
        id: format!("vendor.{}-v1:0", short_name),
        name: short_name.to_uppercase(),
        short_name: short_name.to_string(),
        input_price_per_1k: input_price,
        output_price_per_1k: output_price,
    }
}

fn register_cases(temp: &TempDir) -> DatasetRegistry {
    let session_file = temp.path().join("recording.json");
    std::fs::write(&session_file, SESSION).unwrap();

    let registry = DatasetRegistry::new(temp.path().join("test_cases"));
    registry
        .add_test_case(&session_file, Complexity::Simple, "video_search")
        .unwrap();
    registry
        .add_test_case(&session_file, Complexity::Complex, "search_and_play")
        .unwrap();
    registry
}

#[tokio::test]
async fn test_full_pipeline_with_mock_client() {
    let temp = TempDir::new().unwrap();
    let registry = register_cases(&temp);
    let cases = registry.load_all();
    assert_eq!(cases.len(), 2);

    let client = Arc::new(MockInferenceClient::new(RESPONSE));
    let executor = EvaluationExecutor::new(client, true);
    let models = vec![model("pro", 0.0008, 0.0032), model("lite", 0.00006, 0.00024)];

    let run = executor.execute_all(&models, &cases).await;
    assert_eq!(run.test_case_count, 2);
    assert_eq!(run.models.len(), 2);

    for model_results in &run.models {
        assert_eq!(model_results.stats.scored_count, 2);
        assert!(model_results
            .results
            .iter()
            .all(|r| r.status == EvaluationStatus::Scored));
        assert!((0.0..=1.0).contains(&model_results.stats.avg_overall));
    }

    // Identical responses; the cheaper model must not be ranked by cost.
    let pro = &run.models[0];
    let lite = &run.models[1];
    assert_eq!(pro.stats.avg_overall, lite.stats.avg_overall);
    assert!(pro.cost_per_1000_workflows > lite.cost_per_1000_workflows);

    let results_dir = temp.path().join("results");
    let store = ResultStore::new(&results_dir);
    let saved = store.save_run(&run).unwrap();
    assert!(saved.exists());
    assert!(results_dir.join("pro_results.json").exists());
    assert!(results_dir.join("lite_results.json").exists());

    let loaded = store.load_latest().unwrap();
    assert_eq!(loaded.timestamp, run.timestamp);
    assert_eq!(loaded.models.len(), 2);

    let (analysis, files) = ReportGenerator::new()
        .generate_all(&loaded, &QualityThresholds::default(), &results_dir)
        .unwrap();

    assert!(analysis.recommended_model.is_some());
    for file in [
        "analysis.json",
        "model_comparison.csv",
        "category_breakdown.csv",
        "case_results.csv",
        "score_comparison.png",
        "cost_performance.png",
        "metric_breakdown.png",
        "decision_report.md",
    ] {
        assert!(files.iter().any(|f| f == file), "missing {} in report list", file);
        assert!(results_dir.join(file).exists(), "{} not written", file);
    }

    let report = std::fs::read_to_string(results_dir.join("decision_report.md")).unwrap();
    assert!(report.contains("## Recommended Model"));
}

#[tokio::test]
async fn test_failed_calls_are_excluded_from_scores() {
    let temp = TempDir::new().unwrap();
    let registry = register_cases(&temp);
    let cases = registry.load_all();

    let client = Arc::new(MockInferenceClient::failing(403, "AccessDeniedException"));
    let executor = EvaluationExecutor::new(client, false);

    let run = executor.execute_all(&[model("denied", 0.001, 0.002)], &cases).await;
    let results = &run.models[0];

    assert_eq!(results.stats.failed_count, 2);
    assert_eq!(results.stats.scored_count, 0);
    assert_eq!(results.stats.success_rate, 0.0);
    assert!(run.best_model().is_none());

    let (analysis, _) = ReportGenerator::new()
        .generate_all(&run, &QualityThresholds::default(), &temp.path().join("reports"))
        .unwrap();
    assert_eq!(analysis.recommended_model, None);
}

#[test]
fn test_prepare_writes_summary_and_jsonl() {
    let temp = TempDir::new().unwrap();
    let registry = register_cases(&temp);
    let out = temp.path().join("results");

    let summary = registry.write_summary(&out).unwrap();
    assert_eq!(summary.total_cases, 2);
    assert_eq!(summary.by_category[&Complexity::Medium], 0);

    let written = registry
        .write_evaluation_jsonl(&out.join("evaluation_dataset.jsonl"))
        .unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(out.join("evaluation_dataset.jsonl")).unwrap();
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["category"], "simple");
    assert!(first["prompt"].as_str().unwrap().contains("SESSION DATA:"));
}
