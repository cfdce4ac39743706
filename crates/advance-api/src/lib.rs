//! Advance Access REST API
//!
//! This crate provides the Axum-based HTTP surface: login, user and role
//! management under `/api/v1`, plus health and Prometheus metrics endpoints.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ErrorCode};
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
