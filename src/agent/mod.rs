//! Reasoning agent trait and implementations
//!
//! The reasoning agent is the opaque natural-language fallback. It only sees
//! questions the deterministic classifier could not place.

use crate::models::Dataset;
use crate::Result;
use async_trait::async_trait;

pub mod gemini;
pub use gemini::GeminiAgent;

/// Natural-language-to-data capability (LLM controlled)
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Answer `query` using `dataset` as the only source of facts
    async fn invoke(&self, query: &str, dataset: &Dataset) -> Result<String>;
}
