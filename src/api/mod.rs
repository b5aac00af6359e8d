use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::pipeline::Pipeline;

pub mod handlers;
pub mod models;

pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/search-and-extract/",
            get(handlers::search_and_extract_handler),
        )
        .route(
            "/search-and-extract",
            get(handlers::search_and_extract_handler),
        )
        .with_state(pipeline)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
