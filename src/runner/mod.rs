//! @ai:module:intent Model invocation: prompt building, API client and evaluation loop
//! @ai:module:layer infrastructure
//! @ai:module:public_api BedrockClient, MockInferenceClient, EvaluationExecutor, RateLimiter, build_generation_prompt

pub mod client;
pub mod executor;
pub mod prompt;
pub mod rate_limiter;

pub use client::{BedrockClient, Completion, InferenceClientTrait, MockInferenceClient, API_KEY_ENV};
pub use executor::{EvaluationExecutor, PreparedCase};
pub use prompt::build_generation_prompt;
pub use rate_limiter::{RateLimiter, RateLimiterTrait};
