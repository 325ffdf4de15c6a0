//! @ai:module:intent Markdown model selection report
//! @ai:module:layer infrastructure
//! @ai:module:public_api DecisionReporter, DecisionReporterTrait
//! @ai:module:stateless true

use crate::report::json_report::{Analysis, ModelSummary, ThresholdCompliance};
use crate::scorer::Metric;
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for decision report generation
pub trait DecisionReporterTrait: Send + Sync {
    /// @ai:intent Render the report
    fn render(&self, analysis: &Analysis) -> String;

    /// @ai:intent Render the report to a file
    fn generate(&self, analysis: &Analysis, output_path: &Path) -> Result<()>;
}

/// @ai:intent Recommends the highest-scoring model and compares the alternatives
pub struct DecisionReporter;

impl DecisionReporter {
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:effects pure
    fn format_delta(value: f64) -> String {
        if value >= 0.0 {
            format!("+{:.1}%", value)
        } else {
            format!("{:.1}%", value)
        }
    }

    /// @ai:effects pure
    fn check_mark(met: bool) -> &'static str {
        if met {
            "yes"
        } else {
            "**no**"
        }
    }

    /// @ai:effects pure
    fn generate_header(analysis: &Analysis) -> String {
        let mut output = String::new();

        writeln!(output, "# Model Selection Decision Report").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Evaluation:** {}", analysis.evaluation_timestamp).unwrap();
        writeln!(output, "**Test Cases:** {}", analysis.test_case_count).unwrap();
        writeln!(output, "**Models Evaluated:** {}", analysis.models.len()).unwrap();
        if analysis.dry_run {
            writeln!(output).unwrap();
            writeln!(output, "> Dry run: scores come from a canned response, not real model calls.").unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    /// @ai:effects pure
    fn generate_recommendation(best: &ModelSummary) -> String {
        let mut output = String::new();

        writeln!(output, "## Recommended Model: {}", best.name_or_short()).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Overall Quality | {:.1}% (grade {}) |", best.avg_overall * 100.0, best.grade).unwrap();
        writeln!(output, "| Success Rate | {:.1}% |", best.success_rate * 100.0).unwrap();
        writeln!(output, "| Average Latency | {:.2}s |", best.avg_latency_ms / 1000.0).unwrap();
        writeln!(output, "| Cost per 1000 Workflows | ${:.2} |", best.cost_per_1000_workflows).unwrap();

        for metric in Metric::ALL {
            let score = best.subscores.get(&metric).copied().unwrap_or(0.0);
            writeln!(output, "| {} | {:.1}% |", metric.label(), score * 100.0).unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:effects pure
    fn generate_thresholds(analysis: &Analysis) -> String {
        let mut output = String::new();
        let t = &analysis.thresholds;

        writeln!(output, "## Threshold Compliance").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Model | Selector Accuracy >= {:.0}% | Element Extraction >= {:.0}% | Overall >= {:.0}% |",
            t.min_selector_accuracy * 100.0,
            t.min_element_extraction * 100.0,
            t.min_overall_quality * 100.0
        )
        .unwrap();
        writeln!(output, "|-------|------|------|------|").unwrap();

        for model in &analysis.models {
            let ThresholdCompliance {
                selector_accuracy,
                element_extraction,
                overall_quality,
            } = model.compliance;

            writeln!(
                output,
                "| {} | {} | {} | {} |",
                model.short_name,
                Self::check_mark(selector_accuracy),
                Self::check_mark(element_extraction),
                Self::check_mark(overall_quality)
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        output
    }

    /// @ai:effects pure
    fn generate_alternatives(analysis: &Analysis, best: &ModelSummary) -> String {
        let mut output = String::new();

        writeln!(output, "## Comparison with Alternatives").unwrap();
        writeln!(output).unwrap();

        let alternatives: Vec<_> = analysis
            .models
            .iter()
            .filter(|m| m.short_name != best.short_name)
            .collect();

        if alternatives.is_empty() {
            writeln!(output, "No other models were evaluated.").unwrap();
            writeln!(output).unwrap();
            return output;
        }

        for alt in alternatives {
            let score_diff = (alt.avg_overall - best.avg_overall) * 100.0;
            let cost_diff = if best.cost_per_1000_workflows > 0.0 {
                (alt.cost_per_1000_workflows - best.cost_per_1000_workflows)
                    / best.cost_per_1000_workflows
                    * 100.0
            } else {
                0.0
            };

            writeln!(output, "### {}", alt.name_or_short()).unwrap();
            writeln!(output).unwrap();
            writeln!(
                output,
                "- Score: {:.1}% ({} vs recommended)",
                alt.avg_overall * 100.0,
                Self::format_delta(score_diff)
            )
            .unwrap();
            writeln!(
                output,
                "- Cost per 1000: ${:.2} ({} vs recommended)",
                alt.cost_per_1000_workflows,
                Self::format_delta(cost_diff)
            )
            .unwrap();

            if alt.cost_per_1000_workflows < best.cost_per_1000_workflows {
                writeln!(
                    output,
                    "- ${:.2} cheaper per 1000 workflows but {:.1} points lower quality",
                    best.cost_per_1000_workflows - alt.cost_per_1000_workflows,
                    -score_diff
                )
                .unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    /// @ai:effects pure
    fn generate_rationale(analysis: &Analysis, best: &ModelSummary) -> String {
        let mut output = String::new();

        writeln!(output, "## Decision Rationale").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Selected {} because:", best.name_or_short()).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "1. Highest average quality score ({:.1}%)", best.avg_overall * 100.0).unwrap();

        if best.compliance.overall_quality {
            writeln!(
                output,
                "2. Meets the minimum quality threshold ({:.0}%)",
                analysis.thresholds.min_overall_quality * 100.0
            )
            .unwrap();
        } else {
            writeln!(
                output,
                "2. Note: below the minimum quality threshold ({:.0}%); prompt or model changes are needed before production use",
                analysis.thresholds.min_overall_quality * 100.0
            )
            .unwrap();
        }

        output
    }
}

impl ModelSummary {
    /// @ai:effects pure
    fn name_or_short(&self) -> &str {
        if self.name.is_empty() {
            &self.short_name
        } else {
            &self.name
        }
    }
}

impl Default for DecisionReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionReporterTrait for DecisionReporter {
    /// @ai:effects pure
    fn render(&self, analysis: &Analysis) -> String {
        let mut report = Self::generate_header(analysis);

        let best = analysis
            .recommended_model
            .as_ref()
            .and_then(|short| analysis.models.iter().find(|m| &m.short_name == short));

        match best {
            Some(best) => {
                report.push_str(&Self::generate_recommendation(best));
                report.push_str(&Self::generate_thresholds(analysis));
                report.push_str(&Self::generate_alternatives(analysis, best));
                report.push_str(&Self::generate_rationale(analysis, best));
            }
            None => {
                writeln!(report, "## No Recommendation").unwrap();
                writeln!(report).unwrap();
                writeln!(report, "No model produced a scored result.").unwrap();
            }
        }

        report
    }

    /// @ai:effects fs:write
    fn generate(&self, analysis: &Analysis, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render(analysis))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityThresholds;
    use crate::scorer::Grade;

    fn summary(short_name: &str, avg: f64, cost: f64) -> ModelSummary {
        let thresholds = QualityThresholds::default();
        ModelSummary {
            model_id: format!("vendor.{}", short_name),
            name: String::new(),
            short_name: short_name.to_string(),
            avg_overall: avg,
            grade: Grade::from_score(avg),
            subscores: Metric::ALL.iter().map(|m| (*m, avg)).collect(),
            success_rate: 1.0,
            avg_latency_ms: 1500.0,
            cost_per_1000_workflows: cost,
            total_cost_usd: 0.0,
            compliance: ThresholdCompliance {
                selector_accuracy: avg >= thresholds.min_selector_accuracy,
                element_extraction: avg >= thresholds.min_element_extraction,
                overall_quality: avg >= thresholds.min_overall_quality,
            },
        }
    }

    fn analysis(models: Vec<ModelSummary>, recommended: Option<&str>) -> Analysis {
        Analysis {
            evaluation_timestamp: "20250101_120000".to_string(),
            test_case_count: 5,
            dry_run: false,
            recommended_model: recommended.map(str::to_string),
            thresholds: QualityThresholds::default(),
            models,
        }
    }

    #[test]
    fn test_report_recommends_best_model() {
        let report = DecisionReporter::new().render(&analysis(
            vec![summary("nova-pro", 0.88, 13.6), summary("nova-lite", 0.74, 1.02)],
            Some("nova-pro"),
        ));

        assert!(report.contains("## Recommended Model: nova-pro"));
        assert!(report.contains("| Overall Quality | 88.0% (grade B) |"));
        assert!(report.contains("### nova-lite"));
        assert!(report.contains("-14.0% vs recommended"));
        assert!(report.contains("Meets the minimum quality threshold (85%)"));
    }

    #[test]
    fn test_report_without_scored_models() {
        let report = DecisionReporter::new().render(&analysis(vec![summary("nova-pro", 0.0, 13.6)], None));
        assert!(report.contains("No model produced a scored result."));
    }
}
