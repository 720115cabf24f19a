//! StockSense query engine
//!
//! Answers free-text questions about a table of stocks:
//! - Classifies the question with an ordered rule table
//! - Answers known question shapes deterministically from the dataset
//! - Delegates everything else to an optional reasoning agent (Gemini)
//! - Always returns answer text; only an empty dataset is an error
//!
//! FLOW:
//! QUERY → CLASSIFY → {LOOKUP | AGGREGATE | DELEGATE} → ANSWER

pub mod agent;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod resolver;
pub mod stats;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::{Intent, IntentClassifier};
pub use resolver::{EngineConfig, QueryEngine, FALLBACK_ANSWER, STANDARD_QUERIES};
