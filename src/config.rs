//! @ai:module:intent Configuration structs for the evaluation harness
//! @ai:module:layer infrastructure
//! @ai:module:public_api EvalConfig, ApiConfig, ModelConfig, QualityThresholds, RunConfig, FilterConfig
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// @ai:intent Main configuration for the evaluation harness
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub thresholds: QualityThresholds,
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// @ai:intent Inference endpoint configuration
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Overrides the regional runtime endpoint (proxies, tests)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_rate_limit")]
    pub requests_per_minute: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// @ai:intent One hosted model under evaluation, with its token pricing
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    pub short_name: String,
    /// USD per 1000 input tokens
    #[serde(default)]
    pub input_price_per_1k: f64,
    /// USD per 1000 output tokens
    #[serde(default)]
    pub output_price_per_1k: f64,
}

/// @ai:intent Minimum quality targets a model should reach
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityThresholds {
    #[serde(default = "default_min_selector_accuracy")]
    pub min_selector_accuracy: f64,
    #[serde(default = "default_min_element_extraction")]
    pub min_element_extraction: f64,
    #[serde(default = "default_min_overall_quality")]
    pub min_overall_quality: f64,
}

/// @ai:intent Path configuration for input/output directories
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub test_cases_dir: PathBuf,
    pub results_dir: PathBuf,
}

/// @ai:intent Run configuration for an evaluation
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// @ai:intent Filter configuration for selecting test cases and models
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub categories: Option<Vec<String>>,
    pub names: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            models: default_models(),
            thresholds: QualityThresholds::default(),
            paths: PathConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            requests_per_minute: default_rate_limit(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_selector_accuracy: default_min_selector_accuracy(),
            min_element_extraction: default_min_element_extraction(),
            min_overall_quality: default_min_overall_quality(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            test_cases_dir: PathBuf::from("evaluation/test_cases"),
            results_dir: PathBuf::from("evaluation/results"),
        }
    }
}

fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            id: "amazon.nova-pro-v1:0".to_string(),
            name: "Amazon Nova Pro".to_string(),
            short_name: "nova-pro".to_string(),
            input_price_per_1k: 0.0008,
            output_price_per_1k: 0.0032,
        },
        ModelConfig {
            id: "amazon.nova-lite-v1:0".to_string(),
            name: "Amazon Nova Lite".to_string(),
            short_name: "nova-lite".to_string(),
            input_price_per_1k: 0.00006,
            output_price_per_1k: 0.00024,
        },
        ModelConfig {
            id: "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string(),
            name: "Claude 3.5 Sonnet".to_string(),
            short_name: "claude-3.5".to_string(),
            input_price_per_1k: 0.003,
            output_price_per_1k: 0.015,
        },
    ]
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.1
}

fn default_top_p() -> f32 {
    0.9
}

fn default_rate_limit() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_min_selector_accuracy() -> f64 {
    0.90
}

fn default_min_element_extraction() -> f64 {
    0.80
}

fn default_min_overall_quality() -> f64 {
    0.85
}

impl EvalConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Models selected by the run filter, in configuration order
    /// @ai:effects pure
    pub fn selected_models(&self) -> Vec<ModelConfig> {
        self.models
            .iter()
            .filter(|m| self.run.filter.matches_model(m))
            .cloned()
            .collect()
    }

    /// @ai:intent Look up a configured model by id or short name
    /// @ai:effects pure
    pub fn find_model(&self, key: &str) -> Option<&ModelConfig> {
        self.models
            .iter()
            .find(|m| m.id == key || m.short_name == key)
    }
}

impl FilterConfig {
    /// @ai:intent Check if filter matches a test case
    /// @ai:effects pure
    pub fn matches(&self, category: &str, name: &str) -> bool {
        let category_match = self
            .categories
            .as_ref()
            .map(|c| c.iter().any(|cat| cat == category))
            .unwrap_or(true);

        let name_match = self
            .names
            .as_ref()
            .map(|n| n.iter().any(|case| case == name))
            .unwrap_or(true);

        category_match && name_match
    }

    /// @ai:intent Check if filter selects a model (by id or short name)
    /// @ai:effects pure
    pub fn matches_model(&self, model: &ModelConfig) -> bool {
        self.models
            .as_ref()
            .map(|m| m.iter().any(|key| *key == model.id || *key == model.short_name))
            .unwrap_or(true)
    }
}
