//! @ai:module:intent Rule-based quality scoring of generated workflows
//! @ai:module:layer application
//! @ai:module:public_api QualityScorer, QualityScorerTrait, ScoreReport, ScoredOutput, SessionElements

pub mod action;
pub mod breakdown;
pub mod checks;
pub mod extract;

pub use action::{is_readable_name, parse_workflow, Action, ActionKind, MalformedStep, ParsedWorkflow};
pub use breakdown::{Grade, Metric, ScoreBreakdown};
pub use checks::{CheckOutcome, SessionElements};
pub use extract::{WorkflowExtractor, WorkflowExtractorTrait};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// @ai:intent Full scoring result for one workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub breakdown: ScoreBreakdown,
    pub grade: Grade,
    pub checks: BTreeMap<Metric, CheckOutcome>,
    pub total_steps: usize,
    pub malformed_steps: Vec<MalformedStep>,
}

impl ScoreReport {
    /// @ai:intent Report for a workflow with nothing to score
    /// @ai:effects pure
    pub fn empty(total_steps: usize, malformed_steps: Vec<MalformedStep>) -> Self {
        let breakdown = ScoreBreakdown::zero();

        Self {
            grade: breakdown.grade(),
            breakdown,
            checks: Metric::ALL
                .iter()
                .map(|m| (*m, CheckOutcome::default()))
                .collect(),
            total_steps,
            malformed_steps,
        }
    }
}

/// @ai:intent Score of a raw model response, including parse failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOutput {
    pub report: ScoreReport,
    pub workflow: Option<Value>,
    pub parse_error: Option<String>,
}

/// @ai:intent Trait for workflow scoring
pub trait QualityScorerTrait: Send + Sync {
    /// @ai:intent Score a parsed workflow document
    fn score(&self, workflow: &Value, session: Option<&SessionElements>) -> ScoreReport;

    /// @ai:intent Extract and score the workflow in a raw model response
    fn score_output(&self, response: &str, session: Option<&SessionElements>) -> ScoredOutput;
}

/// @ai:intent Combines extraction and the five checks into a weighted score
pub struct QualityScorer {
    extractor: WorkflowExtractor,
    /// Matches a namespaced key like "Key.enter"
    key_prefix_regex: Regex,
}

impl QualityScorer {
    /// @ai:intent Create a new scorer
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            extractor: WorkflowExtractor::new(),
            key_prefix_regex: Regex::new(r"^[A-Za-z][A-Za-z0-9_]*\.").unwrap(),
        }
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityScorerTrait for QualityScorer {
    /// @ai:intent Run every check over the well-formed steps and weight the results
    /// @ai:effects pure
    fn score(&self, workflow: &Value, session: Option<&SessionElements>) -> ScoreReport {
        let parsed = parse_workflow(workflow);
        let total_steps = parsed.step_count();

        for step in &parsed.malformed {
            tracing::debug!("Skipping malformed step {}: {:?}", step.index, step.reason);
        }

        if !parsed.has_steps {
            return ScoreReport::empty(total_steps, parsed.malformed);
        }

        let actions = &parsed.actions;
        let checks: BTreeMap<Metric, CheckOutcome> = Metric::ALL
            .iter()
            .map(|metric| {
                let outcome = match metric {
                    Metric::SelectorAccuracy => checks::selector_accuracy(actions),
                    Metric::DragParameters => checks::drag_parameters(actions),
                    Metric::ElementExtraction => checks::element_extraction(actions, session),
                    Metric::KeyFormat => checks::key_format(actions, &self.key_prefix_regex),
                    Metric::ActionGrouping => checks::action_grouping(actions),
                };
                (*metric, outcome)
            })
            .collect();

        // No well-formed action fails selector accuracy; other checks stay vacuous.
        let breakdown = ScoreBreakdown::from_subscores(Metric::ALL.map(|m| {
            if m == Metric::SelectorAccuracy && actions.is_empty() {
                0.0
            } else {
                checks[&m].score()
            }
        }));

        ScoreReport {
            grade: breakdown.grade(),
            breakdown,
            checks,
            total_steps,
            malformed_steps: parsed.malformed,
        }
    }

    /// @ai:intent Unparseable output scores zero on every check and keeps the parse error
    /// @ai:effects pure
    fn score_output(&self, response: &str, session: Option<&SessionElements>) -> ScoredOutput {
        match self.extractor.extract(response) {
            Ok(workflow) => ScoredOutput {
                report: self.score(&workflow, session),
                workflow: Some(workflow),
                parse_error: None,
            },
            Err(e) => {
                tracing::warn!(
                    "No workflow extracted. Response preview: {}",
                    truncate_for_log(response, 200)
                );

                ScoredOutput {
                    report: ScoreReport::empty(0, Vec::new()),
                    workflow: None,
                    parse_error: Some(e.to_string()),
                }
            }
        }
    }
}

/// @ai:intent Truncate string for logging
/// @ai:effects pure
pub fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.replace('\n', "\\n")
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", s[..end].replace('\n', "\\n"))
    }
}
