//! Gemini-backed reasoning agent
//!
//! Sends the question plus the dataset (rendered as CSV) to the Gemini
//! `generateContent` endpoint. Uses a long-lived reqwest::Client for
//! connection pooling. One attempt per call; no retries. The API key travels
//! in a header only, so it never shows up in request URLs or error text.

use super::ReasoningAgent;
use crate::error::QueryError;
use crate::models::Dataset;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Reusable Gemini agent (connection-pooled)
pub struct GeminiAgent {
    client: Client,
    api_key: String,
    base_url: String,
    temperature: f32,
}

impl GeminiAgent {
    pub fn new(api_key: String, temperature: f32) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(QueryError::ConfigError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_URL.to_string(),
            temperature,
        })
    }

    fn build_request(&self, query: &str, table: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_user_prompt(query, table),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
        }
    }
}

#[async_trait]
impl ReasoningAgent for GeminiAgent {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn invoke(&self, query: &str, dataset: &Dataset) -> Result<String> {
        let table = dataset.to_csv_string()?;
        let request = self.build_request(query, &table);

        info!(rows = dataset.len(), "Calling Gemini API");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                QueryError::LlmError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(QueryError::LlmError(format!(
                "Gemini API returned {}",
                status
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            QueryError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        let answer = extract_answer(gemini_response)?;

        info!(chars = answer.len(), "Gemini response received");

        Ok(answer)
    }
}

const SYSTEM_PROMPT: &str = r#"You are a stock data analyst.

Guidelines:
- Answer only from the CSV table supplied with the question
- Show figures with the same units as the table (prices in $, performance in %)
- If the table cannot answer the question, say so plainly
- Be concise: one or two sentences"#;

fn build_user_prompt(query: &str, table: &str) -> String {
    format!("Stock data (CSV):\n{}\nQuestion: {}", table, query)
}

fn extract_answer(response: GeminiResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| QueryError::LlmError("No response from Gemini API".to_string()))?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(QueryError::LlmError("Empty response from Gemini".to_string()));
    }

    Ok(text.trim().to_string())
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SecurityRecord;

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            GeminiAgent::new("  ".to_string(), 0.5),
            Err(QueryError::ConfigError(_))
        ));
    }

    #[test]
    fn test_request_carries_table_and_temperature() {
        let agent = GeminiAgent::new("test-key".to_string(), 0.5).unwrap();
        let request = agent.build_request(
            "Which technology stock has the lowest P/E ratio?",
            "Stock Symbol,Price\nAAPL,150.25\n",
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generation_config"]["temperature"], 0.5);

        let text = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("AAPL,150.25"));
        assert!(text.ends_with("Question: Which technology stock has the lowest P/E ratio?"));
    }

    #[test]
    fn test_extract_answer() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"MSFT has "},{"text":"the lowest P/E. "}
        ]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_answer(response).unwrap(), "MSFT has the lowest P/E.");

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(extract_answer(empty), Err(QueryError::LlmError(_))));
    }

    #[tokio::test]
    async fn test_error_text_hides_api_key() {
        let mut agent = GeminiAgent::new("SECRET-KEY-123".to_string(), 0.5).unwrap();
        // nothing listens on the discard port
        agent.base_url = "http://127.0.0.1:9/v1beta/models/test:generateContent".to_string();

        let ds = Dataset::new(vec![SecurityRecord::new(
            "AAPL",
            "Apple Inc.",
            150.25,
            Some(28.5),
            12.5,
            "Technology",
        )])
        .unwrap();

        let err = agent.invoke("Which stock is cheapest?", &ds).await.unwrap_err();
        assert!(matches!(err, QueryError::LlmError(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "leaked: {}", err);
    }
}
