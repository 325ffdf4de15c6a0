//! @ai:module:intent Weighted score breakdown and letter grades
//! @ai:module:layer domain
//! @ai:module:public_api Metric, ScoreBreakdown, Grade
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// @ai:intent One of the five workflow quality sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SelectorAccuracy,
    DragParameters,
    ElementExtraction,
    KeyFormat,
    ActionGrouping,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::SelectorAccuracy,
        Metric::DragParameters,
        Metric::ElementExtraction,
        Metric::KeyFormat,
        Metric::ActionGrouping,
    ];

    /// @ai:intent Weight of the metric in percent
    /// @ai:effects pure
    pub const fn weight_percent(&self) -> u32 {
        match self {
            Metric::SelectorAccuracy => 30,
            Metric::DragParameters => 15,
            Metric::ElementExtraction => 25,
            Metric::KeyFormat => 15,
            Metric::ActionGrouping => 15,
        }
    }

    /// @ai:intent Weight of the metric as a fraction
    /// @ai:effects pure
    pub fn weight(&self) -> f64 {
        f64::from(self.weight_percent()) / 100.0
    }

    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::SelectorAccuracy => "selector_accuracy",
            Metric::DragParameters => "drag_parameters",
            Metric::ElementExtraction => "element_extraction",
            Metric::KeyFormat => "key_format",
            Metric::ActionGrouping => "action_grouping",
        }
    }

    /// @ai:effects pure
    pub fn label(&self) -> &'static str {
        match self {
            Metric::SelectorAccuracy => "Selector Accuracy",
            Metric::DragParameters => "Drag Parameters",
            Metric::ElementExtraction => "Element Extraction",
            Metric::KeyFormat => "Key Format",
            Metric::ActionGrouping => "Action Grouping",
        }
    }
}

const fn total_weight_percent() -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < Metric::ALL.len() {
        total += Metric::ALL[i].weight_percent();
        i += 1;
    }
    total
}

const _: () = assert!(total_weight_percent() == 100, "metric weights must sum to 100%");

/// @ai:intent Clamp a score into [0, 1]; NaN becomes 0
/// @ai:effects pure
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// @ai:intent Five sub-scores plus the weighted overall score, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub selector_accuracy: f64,
    pub drag_parameters: f64,
    pub element_extraction: f64,
    pub key_format: f64,
    pub action_grouping: f64,
    pub overall: f64,
}

impl ScoreBreakdown {
    /// @ai:intent Build a breakdown from sub-scores ordered as `Metric::ALL`
    /// @ai:effects pure
    pub fn from_subscores(scores: [f64; 5]) -> Self {
        let [selector_accuracy, drag_parameters, element_extraction, key_format, action_grouping] =
            scores.map(clamp_unit);

        let mut breakdown = Self {
            selector_accuracy,
            drag_parameters,
            element_extraction,
            key_format,
            action_grouping,
            overall: 0.0,
        };

        let weighted: f64 = Metric::ALL
            .iter()
            .map(|m| f64::from(m.weight_percent()) * breakdown.get(*m))
            .sum();
        breakdown.overall = clamp_unit(weighted / 100.0);

        breakdown
    }

    /// @ai:intent All-zero breakdown for empty or unparseable workflows
    /// @ai:effects pure
    pub fn zero() -> Self {
        Self::default()
    }

    /// @ai:intent Sub-score for a metric
    /// @ai:effects pure
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::SelectorAccuracy => self.selector_accuracy,
            Metric::DragParameters => self.drag_parameters,
            Metric::ElementExtraction => self.element_extraction,
            Metric::KeyFormat => self.key_format,
            Metric::ActionGrouping => self.action_grouping,
        }
    }

    /// @ai:effects pure
    pub fn grade(&self) -> Grade {
        Grade::from_score(self.overall)
    }
}

/// @ai:intent Letter grade of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// @ai:intent Map an overall score to a grade
    /// @ai:effects pure
    /// @ai:example (0.85) -> B
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.9 => Grade::A,
            s if s >= 0.8 => Grade::B,
            s if s >= 0.7 => Grade::C,
            s if s >= 0.6 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", letter)
    }
}
