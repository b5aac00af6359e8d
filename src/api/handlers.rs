use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::Pipeline;

use super::models::{ExtractQuery, ExtractResponse};

pub async fn search_and_extract_handler(
    State(pipeline): State<Arc<Pipeline>>,
    params: Result<Query<ExtractQuery>, QueryRejection>,
) -> Result<Json<ExtractResponse>, (StatusCode, String)> {
    let Query(params) = params.map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid request: {}", e.body_text()),
        )
    })?;

    let start = Instant::now();
    let text = pipeline.search_and_extract(&params.query).await;
    tracing::info!(
        query = %params.query,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search-and-extract finished"
    );

    Ok(Json(ExtractResponse { text }))
}
