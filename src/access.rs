//! @ai:module:intent Check which configured models the API key can actually call
//! @ai:module:layer infrastructure
//! @ai:module:public_api ModelAccessChecker, AccessStatus, ModelAccess, AccessReport
//! @ai:module:stateless true

use crate::config::ModelConfig;
use crate::error::EvalError;
use crate::runner::InferenceClientTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// @ai:intent Outcome of probing one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Accessible,
    NoAccess,
    NotFound,
    NeedsThroughput,
    Throttled,
    Error,
}

impl AccessStatus {
    /// @ai:effects pure
    pub fn label(&self) -> &'static str {
        match self {
            AccessStatus::Accessible => "ACCESSIBLE",
            AccessStatus::NoAccess => "NO ACCESS",
            AccessStatus::NotFound => "NOT FOUND",
            AccessStatus::NeedsThroughput => "THROUGHPUT ISSUE",
            AccessStatus::Throttled => "THROTTLED",
            AccessStatus::Error => "ERROR",
        }
    }

    /// @ai:intent Remediation hint shown next to the status
    /// @ai:effects pure
    pub fn hint(&self) -> &'static str {
        match self {
            AccessStatus::Accessible => "Model is ready to use",
            AccessStatus::NoAccess => "Model not enabled - request access in the Bedrock console",
            AccessStatus::NotFound => "Model ID not available in this region",
            AccessStatus::NeedsThroughput => "Model requires provisioned throughput - try another region",
            AccessStatus::Throttled => "Throttled - retry later or lower requests_per_minute",
            AccessStatus::Error => "Unexpected error",
        }
    }
}

impl std::fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// @ai:intent Probe result for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAccess {
    pub model: ModelConfig,
    pub status: AccessStatus,
    pub message: String,
    pub latency_ms: Option<u64>,
}

/// @ai:intent Probe results for every configured model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessReport {
    pub results: Vec<ModelAccess>,
}

impl AccessReport {
    /// @ai:intent Models that answered the probe
    /// @ai:effects pure
    pub fn accessible_models(&self) -> Vec<ModelConfig> {
        self.results
            .iter()
            .filter(|r| r.status == AccessStatus::Accessible)
            .map(|r| r.model.clone())
            .collect()
    }

    /// @ai:intent Log warnings for models that cannot be used
    /// @ai:effects io
    pub fn log_warnings(&self) {
        for access in self.results.iter().filter(|r| r.status != AccessStatus::Accessible) {
            tracing::warn!(
                "Model '{}' is {} - it will be skipped. {}",
                access.model.short_name,
                access.status,
                access.status.hint()
            );
        }
    }
}

/// @ai:intent Classify a failed probe from its HTTP status and error body
/// @ai:effects pure
pub fn classify_error(error: &EvalError) -> AccessStatus {
    match error {
        EvalError::Api { status, body } => {
            let body = body.to_lowercase();
            match status {
                403 => AccessStatus::NoAccess,
                404 => AccessStatus::NotFound,
                429 => AccessStatus::Throttled,
                400 if body.contains("model identifier") || body.contains("model id") => {
                    AccessStatus::NotFound
                }
                400 if body.contains("throughput") => AccessStatus::NeedsThroughput,
                _ => AccessStatus::Error,
            }
        }
        _ => AccessStatus::Error,
    }
}

/// @ai:intent Sends a tiny prompt to each model to check access
pub struct ModelAccessChecker<C: InferenceClientTrait> {
    client: Arc<C>,
}

impl<C: InferenceClientTrait> ModelAccessChecker<C> {
    /// @ai:effects pure
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// @ai:intent Probe one model
    /// @ai:effects network
    pub async fn check(&self, model: &ModelConfig) -> ModelAccess {
        let start = Instant::now();

        match self.client.probe(&model.id).await {
            Ok(_) => ModelAccess {
                model: model.clone(),
                status: AccessStatus::Accessible,
                message: AccessStatus::Accessible.hint().to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
            Err(e) => {
                ModelAccess {
                    model: model.clone(),
                    status: classify_error(&e),
                    message: e.to_string().chars().take(150).collect(),
                    latency_ms: None,
                }
            }
        }
    }

    /// @ai:intent Probe every model in order
    /// @ai:effects network
    pub async fn check_all(&self, models: &[ModelConfig]) -> AccessReport {
        let mut results = Vec::with_capacity(models.len());

        for model in models {
            let access = self.check(model).await;
            tracing::info!("{}: {}", model.short_name, access.status);
            results.push(access);
        }

        AccessReport { results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockInferenceClient;

    fn api_error(status: u16, body: &str) -> EvalError {
        EvalError::Api {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_classify_error() {
        assert_eq!(classify_error(&api_error(403, "AccessDeniedException")), AccessStatus::NoAccess);
        assert_eq!(classify_error(&api_error(404, "")), AccessStatus::NotFound);
        assert_eq!(classify_error(&api_error(429, "")), AccessStatus::Throttled);
        assert_eq!(
            classify_error(&api_error(400, "The provided model identifier is invalid.")),
            AccessStatus::NotFound
        );
        assert_eq!(
            classify_error(&api_error(400, "Invocation with on-demand throughput isn't supported")),
            AccessStatus::NeedsThroughput
        );
        assert_eq!(classify_error(&api_error(500, "boom")), AccessStatus::Error);
        assert_eq!(classify_error(&EvalError::NoWorkflowJson), AccessStatus::Error);
    }

    #[tokio::test]
    async fn test_check_all_reports_accessible_models() {
        let models = crate::config::EvalConfig::default().models;

        let ok = ModelAccessChecker::new(Arc::new(MockInferenceClient::new("OK")));
        let report = ok.check_all(&models).await;
        assert_eq!(report.accessible_models().len(), models.len());

        let denied = ModelAccessChecker::new(Arc::new(MockInferenceClient::failing(403, "denied")));
        let report = denied.check_all(&models).await;
        assert!(report.accessible_models().is_empty());
        assert!(report.results.iter().all(|r| r.latency_ms.is_none()));
    }
}
