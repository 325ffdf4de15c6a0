//! @ai:module:intent CLI for the workflow generation evaluation harness
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use workflow_eval::{
    access::ModelAccessChecker,
    config::{EvalConfig, FilterConfig, ModelConfig},
    dataset::{Complexity, DatasetRegistry, DatasetRegistryTrait, RecordedSession, TestCase},
    metrics::EvaluationRun,
    report::{ReportGenerator, ResultStore},
    runner::{BedrockClient, EvaluationExecutor, InferenceClientTrait, MockInferenceClient, API_KEY_ENV},
    scorer::{Metric, QualityScorer, QualityScorerTrait, SessionElements},
};

/// Canned response used by dry runs
const DRY_RUN_WORKFLOW: &str = r#"```json
{
  "name": "Dry run workflow",
  "steps": [
    {"action": "CLICK", "selector": {"type": "text", "value": "Search"}},
    {"action": "TYPE_TEXT", "parameters": {"text": "hello", "field": "Search"}},
    {"action": "PRESS_KEY", "parameters": {"key": "Enter"}}
  ]
}
```"#;

#[derive(Parser)]
#[command(name = "workflow-eval")]
#[command(about = "Evaluate hosted models on generating UI-automation workflows from recorded sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a recorded session as a test case
    Add {
        /// Recorded session JSON file
        session_file: PathBuf,

        /// Complexity category (simple, medium, complex)
        #[arg(long)]
        category: String,

        /// Unique test case name
        #[arg(long)]
        name: String,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the dataset summary and the JSONL evaluation dataset
    Prepare {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List registered test cases
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Evaluate every selected model on every selected test case
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Score a single workflow file offline
    Score {
        /// Workflow JSON file or raw model response
        workflow_file: PathBuf,

        /// Recorded session used as element-name reference
        #[arg(long)]
        session: Option<PathBuf>,
    },

    /// Generate reports from a saved run
    Analyze {
        /// Run file; defaults to the latest run in the results directory
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Output directory for reports; defaults to the results directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Prepare, run and analyze in one go
    Pipeline {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Check which configured models are accessible
    Check {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bedrock API key
        #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "eval.toml")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Filter by categories (comma-separated)
    #[arg(long)]
    categories: Option<String>,

    /// Filter by test case names (comma-separated)
    #[arg(long)]
    names: Option<String>,

    /// Filter by model id or short name (comma-separated)
    #[arg(long)]
    models: Option<String>,

    /// Run without making API calls
    #[arg(long)]
    dry_run: bool,

    /// Probe models first and skip inaccessible ones
    #[arg(long)]
    check_access: bool,

    /// Bedrock API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("workflow_eval=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add {
            session_file,
            category,
            name,
            config,
        } => add_test_case(session_file, &category, &name, config),
        Commands::Prepare { config } => {
            let config = load_or_default_config(config)?;
            prepare_dataset(&config)
        }
        Commands::List { category, config } => list_test_cases(category, config),
        Commands::Run { args } => run_evaluation(args).await.map(|_| ()),
        Commands::Score {
            workflow_file,
            session,
        } => score_workflow(&workflow_file, session.as_deref()),
        Commands::Analyze {
            results,
            output,
            config,
        } => analyze(results, output, config),
        Commands::Pipeline { args } => run_pipeline(args).await,
        Commands::Check { config, api_key } => check_access(config, api_key).await,
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Copy a recorded session into the dataset
/// @ai:effects fs:read, fs:write
fn add_test_case(session_file: PathBuf, category: &str, name: &str, config: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config)?;
    let category: Complexity = category.parse()?;

    let registry = DatasetRegistry::new(&config.paths.test_cases_dir);
    let case = registry
        .add_test_case(&session_file, category, name)
        .with_context(|| format!("Failed to add {}", session_file.display()))?;

    println!("Added test case {} ({})", case.id(), case.session_path.display());
    Ok(())
}

/// @ai:intent Write dataset_summary.json and evaluation_dataset.jsonl
/// @ai:effects fs:read, fs:write
fn prepare_dataset(config: &EvalConfig) -> Result<()> {
    let registry = DatasetRegistry::new(&config.paths.test_cases_dir);
    let summary = registry.write_summary(&config.paths.results_dir)?;
    let written = registry
        .write_evaluation_jsonl(&config.paths.results_dir.join("evaluation_dataset.jsonl"))?;

    println!("Dataset: {} test cases", summary.total_cases);
    for (category, count) in &summary.by_category {
        println!("  {:<10} {}", category.label(), count);
    }
    println!("Wrote {} prompts to evaluation_dataset.jsonl", written);

    Ok(())
}

/// @ai:intent List registered test cases
/// @ai:effects fs:read
fn list_test_cases(category: Option<String>, config: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config)?;
    let registry = DatasetRegistry::new(&config.paths.test_cases_dir);

    let filter = FilterConfig {
        categories: category.map(|c| vec![c.trim().to_ascii_lowercase()]),
        ..Default::default()
    };
    let cases = registry.load_filtered(&filter);

    println!("Registered test cases ({}):", cases.len());
    println!();
    println!("{:<10} {:<40} {}", "Category", "Name", "Session");
    println!("{}", "-".repeat(80));

    for case in &cases {
        println!(
            "{:<10} {:<40} {}",
            case.category.as_str(),
            case.name,
            case.session_path.display()
        );
    }

    Ok(())
}

/// @ai:intent Evaluate models on the selected test cases and save the run
/// @ai:effects fs:read, fs:write, network
async fn run_evaluation(args: RunArgs) -> Result<Option<(EvalConfig, PathBuf)>> {
    let mut config = load_or_default_config(args.config)?;

    config.run.dry_run = config.run.dry_run || args.dry_run;
    config.run.filter = build_filter(args.categories, args.names, args.models);

    let registry = DatasetRegistry::new(&config.paths.test_cases_dir);
    tracing::info!("Loading test cases from {}", registry.root().display());

    let cases = registry.load_filtered(&config.run.filter);
    if cases.is_empty() {
        tracing::warn!("No test cases match the filter criteria");
        return Ok(None);
    }

    let models = config.selected_models();
    if models.is_empty() {
        tracing::warn!("No models match the filter criteria");
        return Ok(None);
    }

    tracing::info!("Found {} test cases and {} models", cases.len(), models.len());

    let run = if config.run.dry_run {
        tracing::info!("Dry run: using canned responses");
        let client = Arc::new(MockInferenceClient::new(DRY_RUN_WORKFLOW));
        execute(client, &models, &cases, true, false).await
    } else {
        let client = Arc::new(bedrock_client(&config, args.api_key)?);
        execute(client, &models, &cases, false, args.check_access).await
    };

    let Some(run) = run else {
        return Ok(None);
    };

    let store = ResultStore::new(&config.paths.results_dir);
    let path = store.save_run(&run)?;

    print_summary(&run);
    println!("Results saved to {}", path.display());

    Ok(Some((config, path)))
}

/// @ai:intent Optionally filter models by access, then run the evaluation loop
/// @ai:effects network
async fn execute<C: InferenceClientTrait>(
    client: Arc<C>,
    models: &[ModelConfig],
    cases: &[TestCase],
    dry_run: bool,
    check_access: bool,
) -> Option<EvaluationRun> {
    let models = if check_access {
        let report = ModelAccessChecker::new(Arc::clone(&client)).check_all(models).await;
        report.log_warnings();
        report.accessible_models()
    } else {
        models.to_vec()
    };

    if models.is_empty() {
        tracing::error!("No accessible models. Cannot run evaluation.");
        return None;
    }

    let executor = EvaluationExecutor::new(client, dry_run);
    Some(executor.execute_all(&models, cases).await)
}

/// @ai:intent Score one workflow file and print the breakdown
/// @ai:effects fs:read
fn score_workflow(workflow_file: &Path, session: Option<&Path>) -> Result<()> {
    let content = std::fs::read_to_string(workflow_file)
        .with_context(|| format!("Failed to read {}", workflow_file.display()))?;

    let elements = session
        .map(|path| RecordedSession::load(path).map(|s| SessionElements::from_session(&s)))
        .transpose()?;

    let scored = QualityScorer::new().score_output(&content, elements.as_ref());
    let report = &scored.report;

    if let Some(error) = &scored.parse_error {
        println!("Could not parse workflow: {}", error);
        println!();
    }

    println!("Workflow score: {}", workflow_file.display());
    println!("{}", "-".repeat(40));
    for metric in Metric::ALL {
        println!("{:<22} {:>6.3}", metric.label(), report.breakdown.get(metric));
    }
    println!("{}", "-".repeat(40));
    println!(
        "{:<22} {:>6.3}  (grade {})",
        "Overall",
        report.breakdown.overall,
        report.grade
    );

    if !report.malformed_steps.is_empty() {
        println!();
        println!("Skipped steps:");
        for step in &report.malformed_steps {
            println!("  step {}: {:?}", step.index, step.reason);
        }
    }

    Ok(())
}

/// @ai:intent Generate reports from a saved run
/// @ai:effects fs:read, fs:write
fn analyze(results: Option<PathBuf>, output: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config)?;
    let store = ResultStore::new(&config.paths.results_dir);

    let run = match results {
        Some(path) => ResultStore::load(&path)?,
        None => store.load_latest()?,
    };

    let output_dir = output.unwrap_or_else(|| config.paths.results_dir.clone());
    let (analysis, files) = ReportGenerator::new().generate_all(&run, &config.thresholds, &output_dir)?;

    println!("Reports generated in {}", output_dir.display());
    for file in &files {
        println!("  - {}", file);
    }

    match analysis.recommended_model {
        Some(model) => println!("Recommended model: {}", model),
        None => println!("No model produced a scored result"),
    }

    Ok(())
}

/// @ai:intent Prepare the dataset, run the evaluation and generate reports
/// @ai:effects fs:read, fs:write, network
async fn run_pipeline(args: RunArgs) -> Result<()> {
    let config = load_or_default_config(args.config.clone())?;

    println!("Step 1/3: preparing dataset");
    prepare_dataset(&config)?;

    println!("Step 2/3: running evaluation");
    let Some((config, path)) = run_evaluation(args).await? else {
        tracing::warn!("Evaluation produced no results; skipping analysis");
        return Ok(());
    };

    println!("Step 3/3: generating reports");
    let run = ResultStore::load(&path)?;
    ReportGenerator::new().generate_all(&run, &config.thresholds, &config.paths.results_dir)?;

    println!("Pipeline complete. Reports in {}", config.paths.results_dir.display());
    Ok(())
}

/// @ai:intent Probe every configured model and print its access status
/// @ai:effects network
async fn check_access(config: Option<PathBuf>, api_key: Option<String>) -> Result<()> {
    let config = load_or_default_config(config)?;
    let client = Arc::new(bedrock_client(&config, api_key)?);

    println!("Checking model access in {}...", config.api.region);
    let report = ModelAccessChecker::new(client).check_all(&config.models).await;

    println!();
    println!("{:<15} {:<22} {:>10}  {}", "Model", "Status", "Latency", "Details");
    println!("{}", "-".repeat(90));

    for access in &report.results {
        let latency = access
            .latency_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<15} {:<22} {:>10}  {}",
            access.model.short_name,
            access.status.label(),
            latency,
            access.message
        );
    }

    let accessible = report.accessible_models();
    println!();
    println!("{}/{} models accessible", accessible.len(), report.results.len());
    report.log_warnings();

    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = EvalConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Build a Bedrock client from the CLI key or the environment
/// @ai:effects env
fn bedrock_client(config: &EvalConfig, api_key: Option<String>) -> Result<BedrockClient> {
    match api_key {
        Some(key) => Ok(BedrockClient::new(config.api.clone(), key)?),
        None => BedrockClient::from_env(config.api.clone()),
    }
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<EvalConfig> {
    match path {
        Some(p) => EvalConfig::load(&p).with_context(|| format!("Failed to load {}", p.display())),
        None => {
            let default_path = PathBuf::from("eval.toml");

            if default_path.exists() {
                EvalConfig::load(&default_path)
            } else {
                Ok(EvalConfig::default())
            }
        }
    }
}

/// @ai:intent Build filter from CLI arguments
/// @ai:effects pure
fn build_filter(categories: Option<String>, names: Option<String>, models: Option<String>) -> FilterConfig {
    fn split(s: String) -> Vec<String> {
        s.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    }

    FilterConfig {
        categories: categories.map(|s| split(s.to_ascii_lowercase())),
        names: names.map(split),
        models: models.map(split),
    }
}

/// @ai:intent Print summary to console
/// @ai:effects io
fn print_summary(run: &EvaluationRun) {
    println!();
    println!("Workflow Generation Evaluation");
    println!("==============================");
    if run.dry_run {
        println!("(dry run)");
    }
    println!();

    println!(
        "{:<15} {:>8} {:>6} {:>9} {:>10} {:>12}",
        "Model", "Score", "Grade", "Success", "Latency", "Cost/1000"
    );
    println!("{}", "-".repeat(65));

    for model in &run.models {
        let stats = &model.stats;
        println!(
            "{:<15} {:>7.1}% {:>6} {:>8.0}% {:>9.2}s {:>11.2}$",
            model.model.short_name,
            stats.avg_overall * 100.0,
            workflow_eval::scorer::Grade::from_score(stats.avg_overall).to_string(),
            stats.success_rate * 100.0,
            stats.avg_latency_ms / 1000.0,
            model.cost_per_1000_workflows
        );
    }
    println!();

    print_failures(run);

    if let Some(best) = run.best_model() {
        println!("Best model: {} ({:.1}%)", best.model.short_name, best.stats.avg_overall * 100.0);
    }
}

/// @ai:intent Print failed evaluations, one line each
/// @ai:effects io
fn print_failures(run: &EvaluationRun) {
    let failures: Vec<_> = run
        .models
        .iter()
        .flat_map(|m| m.results.iter())
        .filter(|r| !r.is_scored())
        .collect();

    if failures.is_empty() {
        return;
    }

    println!("Failed evaluations:");
    for result in failures {
        println!(
            "  {} on {}: {}",
            result.model_short_name,
            result.test_case,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!();
}
