//! @ai:module:intent Chart generation for model comparison
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChartGenerator
//! @ai:module:stateless true

use crate::metrics::EvaluationRun;
use crate::scorer::Metric;
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

const PALETTE: [RGBColor; 5] = [
    RGBColor(255, 107, 107),
    RGBColor(78, 205, 196),
    RGBColor(69, 183, 209),
    RGBColor(247, 183, 51),
    RGBColor(136, 132, 216),
];

/// @ai:intent Trait for chart generation
pub trait ChartGeneratorTrait: Send + Sync {
    /// @ai:intent Generate all charts from a run
    fn generate_all(&self, run: &EvaluationRun, target_score: f64, output_dir: &Path) -> Result<Vec<String>>;
}

/// @ai:intent Generates PNG charts from evaluation runs
pub struct ChartGenerator;

impl ChartGenerator {
    /// @ai:intent Create a new chart generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Average overall score per model with the target line
    /// @ai:effects fs:write
    fn generate_score_chart(&self, run: &EvaluationRun, target_score: f64, output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let data: Vec<(&str, f64)> = run
            .models
            .iter()
            .map(|m| (m.model.short_name.as_str(), m.stats.avg_overall * 100.0))
            .collect();
        let n = data.len() as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption("Model Quality Comparison", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..n - 0.5, 0f64..100f64)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(data.len())
            .y_desc("Average Quality Score (%)")
            .x_label_formatter(&|x| label_at(&data, *x, |(name, _)| name.to_string()))
            .draw()?;

        chart.draw_series(data.iter().enumerate().map(|(i, (_, score))| {
            let x = i as f64;
            Rectangle::new([(x - 0.3, 0.0), (x + 0.3, *score)], color(i).filled())
        }))?;

        chart.draw_series(data.iter().enumerate().map(|(i, (_, score))| {
            Text::new(
                format!("{:.1}%", score),
                (i as f64 - 0.1, (*score + 2.0).min(98.0)),
                ("sans-serif", 15),
            )
        }))?;

        let target = target_score * 100.0;
        chart
            .draw_series(LineSeries::new(
                vec![(-0.5, target), (n - 0.5, target)],
                RED.stroke_width(2),
            ))?
            .label(format!("Target ({:.0}%)", target))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// @ai:intent Scatter of projected cost against quality
    /// @ai:effects fs:write
    fn generate_cost_chart(&self, run: &EvaluationRun, output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let points: Vec<(&str, f64, f64)> = run
            .models
            .iter()
            .map(|m| {
                (
                    m.model.short_name.as_str(),
                    m.cost_per_1000_workflows,
                    m.stats.avg_overall * 100.0,
                )
            })
            .collect();

        let max_cost = points
            .iter()
            .map(|(_, cost, _)| *cost)
            .fold(0.0f64, f64::max)
            .max(1.0);

        let mut chart = ChartBuilder::on(&root)
            .caption("Cost vs Performance Trade-off", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..max_cost * 1.25, 0f64..100f64)?;

        chart
            .configure_mesh()
            .x_desc("Cost per 1000 Workflows ($)")
            .y_desc("Average Quality Score (%)")
            .draw()?;

        chart.draw_series(
            points
                .iter()
                .enumerate()
                .map(|(i, (_, cost, score))| Circle::new((*cost, *score), 8, color(i).filled())),
        )?;

        chart.draw_series(points.iter().map(|(name, cost, score)| {
            Text::new(name.to_string(), (*cost, (*score + 3.0).min(97.0)), ("sans-serif", 15))
        }))?;

        root.present()?;
        Ok(())
    }

    /// @ai:intent Grouped bars of each sub-score per model
    /// @ai:effects fs:write
    fn generate_metric_chart(&self, run: &EvaluationRun, output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, (1100, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let metrics: Vec<(&str, Metric)> = Metric::ALL.iter().map(|m| (m.label(), *m)).collect();
        let model_count = run.models.len().max(1);
        let bar_width = 0.8 / model_count as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption("Sub-score Breakdown", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..metrics.len() as f64 - 0.5, 0f64..100f64)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(metrics.len())
            .y_desc("Score (%)")
            .x_label_formatter(&|x| label_at(&metrics, *x, |(label, _)| label.to_string()))
            .draw()?;

        for (model_index, model) in run.models.iter().enumerate() {
            let fill = color(model_index);
            let offset = -0.4 + bar_width * model_index as f64;

            chart
                .draw_series(metrics.iter().enumerate().map(|(i, (_, metric))| {
                    let left = i as f64 + offset;
                    let value = model.stats.subscore(*metric) * 100.0;
                    Rectangle::new([(left, 0.0), (left + bar_width, value)], fill.filled())
                }))?
                .label(model.model.short_name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], fill.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartGeneratorTrait for ChartGenerator {
    /// @ai:intent Generate all charts; nothing is drawn for a run without models
    /// @ai:effects fs:write
    fn generate_all(&self, run: &EvaluationRun, target_score: f64, output_dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(output_dir)?;

        if run.models.is_empty() {
            tracing::warn!("No models in run, skipping charts");
            return Ok(Vec::new());
        }

        let mut generated = Vec::new();

        self.generate_score_chart(run, target_score, &output_dir.join("score_comparison.png"))?;
        generated.push("score_comparison.png".to_string());

        self.generate_cost_chart(run, &output_dir.join("cost_performance.png"))?;
        generated.push("cost_performance.png".to_string());

        self.generate_metric_chart(run, &output_dir.join("metric_breakdown.png"))?;
        generated.push("metric_breakdown.png".to_string());

        Ok(generated)
    }
}

/// @ai:effects pure
fn color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// @ai:intent Category label for an axis position; blank between categories
/// @ai:effects pure
fn label_at<T>(items: &[T], x: f64, label: impl Fn(&T) -> String) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }

    items.get(rounded as usize).map(label).unwrap_or_default()
}
