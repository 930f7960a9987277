//! LabelGuard Gateway HTTP API Server
//!
//! Exposes compliance analysis, history, analytics, and catalog routes over axum.

pub mod analyze;
pub mod catalog_api;
pub mod error;
pub mod health_api;
pub mod history_api;
pub mod rate_limit;
pub mod server;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use server::{build_router, start_server, GatewayState};
