//! Axum HTTP API server.
//!
//! This crate provides:
//! - Submission endpoints for video and audio generation
//! - Job status polling and artifact delivery
//! - Wallet balance queries and payment confirmation grants
//! - Health probes for the process and the database

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
