//! Prometheus scrape endpoint

use axum::{Router, http::header::CONTENT_TYPE, response::IntoResponse, routing::get};
use std::sync::Arc;

use crate::state::MetricsHandle;

/// Text exposition format understood by Prometheus scrapers
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `/metrics`, served from its own router so it needs no application state
pub fn routes(handle: Arc<MetricsHandle>) -> Router {
    Router::new().route("/metrics", get(move || scrape(handle.clone())))
}

async fn scrape(handle: Arc<MetricsHandle>) -> impl IntoResponse {
    ([(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], handle.render())
}
