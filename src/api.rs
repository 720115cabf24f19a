//! REST API Server for the stock query engine
//!
//! Exposes query resolution, dataset statistics and the filtered stock
//! table over HTTP.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::models::{Dataset, DatasetFilter};
use crate::resolver::QueryEngine;
use crate::stats;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryRequest {
    pub query: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

/// The dataset is loaded once at startup and shared read-only.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<QueryEngine>,
    pub dataset: Arc<Dataset>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "stocks": state.dataset.len(),
        "reasoning_agent": state.engine.has_agent(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Query Endpoint
/// =============================

async fn run_query(
    State(state): State<ApiState>,
    Json(req): Json<QueryRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let query = req.query.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Please enter a query to analyze.".into())),
        );
    }

    info!("Received query: {}", query);

    match state.engine.resolve(query, &state.dataset).await {
        Ok(answer) => (StatusCode::OK, Json(ApiResponse::success(answer))),
        Err(e) => {
            error!(error = %e, "Query resolution failed");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::error(format!("Query failed: {}", e))),
            )
        }
    }
}

/// =============================
/// Statistics Endpoint
/// =============================

async fn get_stats(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    match stats::summarize(&state.dataset) {
        Ok(snapshot) => (StatusCode::OK, Json(ApiResponse::success(snapshot))),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(e.to_string())),
        ),
    }
}

/// =============================
/// Data Explorer Endpoint
/// =============================

async fn list_stocks(
    State(state): State<ApiState>,
    Query(filter): Query<DatasetFilter>,
) -> Json<ApiResponse> {
    let stocks = state.dataset.filter(&filter);
    Json(ApiResponse::success(serde_json::json!({
        "count": stocks.len(),
        "stocks": stocks,
    })))
}

/// =============================
/// Router
/// =============================

pub fn create_router(engine: Arc<QueryEngine>, dataset: Arc<Dataset>) -> Router {
    let state = ApiState { engine, dataset };

    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(run_query))
        .route("/api/stats", get(get_stats))
        .route("/api/stocks", get(list_stocks))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    engine: Arc<QueryEngine>,
    dataset: Arc<Dataset>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(engine, dataset);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
