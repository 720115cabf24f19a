//! Query resolution engine
//!
//! Classifies a question, answers it from the dataset when a rule matches,
//! and otherwise delegates to the configured reasoning agent.
//!
//! The engine holds no per-call state. The dataset is borrowed for the
//! duration of a call and never retained.

use crate::agent::ReasoningAgent;
use crate::classifier::{Intent, IntentClassifier};
use crate::error::QueryError;
use crate::models::{Answer, Dataset, SecurityRecord};
use crate::stats;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Returned for unclassified questions when the agent is absent or fails
pub const FALLBACK_ANSWER: &str =
    "I don't have enough information to answer that specific question in the current mode.";

/// Returned when a classified symbol cannot be found at lookup time
pub const LOOKUP_FAILED_ANSWER: &str = "The lookup failed for the requested stock.";

/// Default wall-clock limit for one agent call
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Predefined questions run when no custom query is given
pub const STANDARD_QUERIES: &[&str] = &[
    "What is the stock price of AAPL?",
    "What is the performance of TSLA?",
    "What is the PE ratio of MSFT?",
    "Which stock has the highest price?",
    "What is the average stock price?",
    "Which sector has the most stocks?",
    "What is the market cap of AMZN?",
    "Which technology stock has the lowest P/E ratio?",
];

/// Caller-supplied engine configuration
#[derive(Clone)]
pub struct EngineConfig {
    pub agent: Option<Arc<dyn ReasoningAgent>>,
    pub agent_timeout: Duration,
}

impl EngineConfig {
    /// Deterministic-only configuration
    pub fn offline() -> Self {
        Self {
            agent: None,
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    pub fn with_agent(agent: Arc<dyn ReasoningAgent>, agent_timeout: Duration) -> Self {
        Self {
            agent: Some(agent),
            agent_timeout,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::offline()
    }
}

/// Query resolution engine
pub struct QueryEngine {
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn has_agent(&self) -> bool {
        self.config.agent.is_some()
    }

    /// Answer a question.
    ///
    /// Only `EmptyDataset` escapes; every other failure becomes answer text.
    pub async fn resolve(&self, query: &str, dataset: &Dataset) -> Result<Answer> {
        let intent = IntentClassifier::classify(query, dataset);
        debug!(%intent, "Classified query");

        let response = match intent {
            Intent::Unclassified => self.fallback(query, dataset).await,
            intent => match answer_intent(&intent, dataset) {
                Ok(text) => text,
                Err(QueryError::EmptyDataset) => return Err(QueryError::EmptyDataset),
                Err(e) => {
                    warn!(%intent, error = %e, "Deterministic lookup failed");
                    LOOKUP_FAILED_ANSWER.to_string()
                }
            },
        };

        Ok(Answer::new(query, response))
    }

    /// Resolve queries one after another, in order
    pub async fn resolve_all<S: AsRef<str>>(
        &self,
        queries: &[S],
        dataset: &Dataset,
    ) -> Result<Vec<Answer>> {
        let mut answers = Vec::with_capacity(queries.len());
        for query in queries {
            let query = query.as_ref();
            info!(query, "Running query");
            answers.push(self.resolve(query, dataset).await?);
        }
        Ok(answers)
    }

    pub async fn run_standard_queries(&self, dataset: &Dataset) -> Result<Vec<Answer>> {
        self.resolve_all(STANDARD_QUERIES, dataset).await
    }

    /// Hand the raw question and dataset to the reasoning agent.
    ///
    /// Fails with `AgentUnavailable` without calling anything when no agent
    /// is configured, and with `AgentExecution` on error or timeout.
    pub async fn delegate(&self, query: &str, dataset: &Dataset) -> Result<String> {
        let agent = self.config.agent.as_ref().ok_or(QueryError::AgentUnavailable)?;

        debug!(agent = agent.name(), "Delegating query");

        match tokio::time::timeout(self.config.agent_timeout, agent.invoke(query, dataset)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(QueryError::AgentExecution(e.to_string())),
            Err(_) => Err(QueryError::AgentExecution(format!(
                "timed out after {:?}",
                self.config.agent_timeout
            ))),
        }
    }

    async fn fallback(&self, query: &str, dataset: &Dataset) -> String {
        match self.delegate(query, dataset).await {
            Ok(text) => text,
            Err(QueryError::AgentUnavailable) => {
                debug!("No reasoning agent configured");
                FALLBACK_ANSWER.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Reasoning agent failed");
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}

/// Format the answer for a classified intent
fn answer_intent(intent: &Intent, dataset: &Dataset) -> Result<String> {
    match intent {
        Intent::PriceLookup(symbol) => {
            let record = lookup(dataset, symbol)?;
            Ok(format!("The stock price of {} is ${:.2}", symbol, record.price))
        }
        Intent::PerformanceLookup(symbol) => {
            let record = lookup(dataset, symbol)?;
            Ok(format!("The performance of {} is {:.2}%", symbol, record.performance))
        }
        Intent::RatioLookup(symbol) => {
            let record = lookup(dataset, symbol)?;
            Ok(match record.pe_ratio {
                Some(pe) if pe > 0.0 => format!("The P/E Ratio of {} is {:.1}", symbol, pe),
                _ => format!("The P/E Ratio of {} is not available", symbol),
            })
        }
        Intent::MaxPriceLookup => {
            let snapshot = stats::summarize(dataset)?;
            let record = lookup(dataset, &snapshot.highest_price)?;
            Ok(format!(
                "The stock with the highest price is {} ({}) with a price of ${:.2}",
                record.name, record.symbol, record.price
            ))
        }
        Intent::AveragePriceLookup => {
            let snapshot = stats::summarize(dataset)?;
            Ok(format!("The average stock price is ${:.2}", snapshot.average_price))
        }
        Intent::DominantSectorLookup => {
            let snapshot = stats::summarize(dataset)?;
            let top = snapshot.dominant_sector().ok_or(QueryError::EmptyDataset)?;
            Ok(format!(
                "The sector with the most stocks is {} with {} {}",
                top.sector,
                top.count,
                if top.count == 1 { "stock" } else { "stocks" }
            ))
        }
        Intent::Unclassified => Ok(FALLBACK_ANSWER.to_string()),
    }
}

fn lookup<'a>(dataset: &'a Dataset, symbol: &str) -> Result<&'a SecurityRecord> {
    dataset
        .get(symbol)
        .ok_or_else(|| QueryError::UnknownSymbol(symbol.to_string()))
}
