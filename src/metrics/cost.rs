//! @ai:module:intent Token-based cost estimation
//! @ai:module:layer domain
//! @ai:module:public_api call_cost, cost_per_1000_workflows
//! @ai:module:stateless true

use crate::config::ModelConfig;
use crate::metrics::types::AggregateStats;

/// Typical prompt size of one workflow generation, used before anything is measured
pub const NOMINAL_INPUT_TOKENS: f64 = 5000.0;
/// Typical completion size of one workflow generation
pub const NOMINAL_OUTPUT_TOKENS: f64 = 3000.0;

/// @ai:intent USD cost of one call
/// @ai:effects pure
/// @ai:example (nova-pro, 1000, 1000) -> 0.004
pub fn call_cost(model: &ModelConfig, input_tokens: u32, output_tokens: u32) -> f64 {
    token_cost(model, f64::from(input_tokens), f64::from(output_tokens))
}

fn token_cost(model: &ModelConfig, input_tokens: f64, output_tokens: f64) -> f64 {
    input_tokens / 1000.0 * model.input_price_per_1k
        + output_tokens / 1000.0 * model.output_price_per_1k
}

/// @ai:intent Projected USD cost of generating 1000 workflows
///            Uses measured average token counts, or nominal ones when nothing was scored
/// @ai:effects pure
pub fn cost_per_1000_workflows(model: &ModelConfig, stats: &AggregateStats) -> f64 {
    let (input, output) = if stats.scored_count > 0 {
        (stats.avg_input_tokens, stats.avg_output_tokens)
    } else {
        (NOMINAL_INPUT_TOKENS, NOMINAL_OUTPUT_TOKENS)
    };

    token_cost(model, input, output) * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nova_pro() -> ModelConfig {
        ModelConfig {
            id: "amazon.nova-pro-v1:0".to_string(),
            short_name: "nova-pro".to_string(),
            input_price_per_1k: 0.0008,
            output_price_per_1k: 0.0032,
            ..Default::default()
        }
    }

    #[test]
    fn test_call_cost() {
        assert!((call_cost(&nova_pro(), 1000, 1000) - 0.004).abs() < 1e-12);
        assert_eq!(call_cost(&nova_pro(), 0, 0), 0.0);
    }

    #[test]
    fn test_nominal_projection_without_measurements() {
        let cost = cost_per_1000_workflows(&nova_pro(), &AggregateStats::default());
        // 5 * 0.0008 + 3 * 0.0032 = 0.0136 per workflow
        assert!((cost - 13.6).abs() < 1e-9);
    }

    #[test]
    fn test_measured_projection() {
        let stats = AggregateStats {
            scored_count: 2,
            avg_input_tokens: 2000.0,
            avg_output_tokens: 1000.0,
            ..Default::default()
        };

        let cost = cost_per_1000_workflows(&nova_pro(), &stats);
        assert!((cost - 4.8).abs() < 1e-9);
    }
}
