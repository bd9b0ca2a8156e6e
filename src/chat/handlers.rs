//! Chart-config generation handler

use axum::extract::Extension;
use axum::Json;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::common::{ApiError, ApiJson, AppState};

#[derive(Deserialize, Debug)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: String,
}

/// POST /api/chat
/// Generates an ECharts option object from a natural-language query
///
/// # Request Body
/// ```json
/// {
///   "query": "Generate a line graph with sales data"
/// }
/// ```
pub async fn generate_chart_config(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiJson(payload): ApiJson<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.query.is_empty() {
        return Err(ApiError::BadRequest("No query provided".to_string()));
    }

    let state = state_lock.read().await.clone();

    let prompt = build_chart_prompt(&payload.query);

    let response_text = state
        .gemini_service
        .generate_content(&prompt)
        .await
        .map_err(|e| {
            warn!(error = %e, "Chart generation request failed");
            ApiError::InternalServer(e.to_string())
        })?;

    let json_str = strip_code_fence(response_text.trim());

    // The model sometimes wraps output in a fence anyway; after unwrapping,
    // anything that is not valid JSON is a hard failure
    let chart_config: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
        warn!(error = %e, "Generated chart config is not valid JSON");
        ApiError::InvalidChartConfig("Invalid ECharts configuration generated".to_string())
    })?;

    info!("Chart config generated");

    Ok(Json(serde_json::json!({
        "success": true,
        "chartConfig": chart_config,
    })))
}

/// Fixed instruction prompt demanding a bare JSON ECharts option object
pub fn build_chart_prompt(query: &str) -> String {
    format!(
        "You are an expert in generating ECharts configuration code for charts. \
         Based on the user's query, generate an ECharts option object as a valid JSON string, \
         compatible with echarts-for-react. Include sample data since no external data is provided. \
         Return ONLY the JSON object as a string, without markdown (e.g., no ```json or ```), \
         without explanations, and without any extra text or whitespace outside the JSON.\n\n\
         User Query:\n{}",
        query
    )
}

/// Unwrap an optional leading ```json fenced block
pub fn strip_code_fence(text: &str) -> &str {
    // Compiled once; the pattern is a constant
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```json\s*(.*?)\s*```").expect("fence pattern is valid")
    });

    match fence.captures(text) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text,
    }
}
