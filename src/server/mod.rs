//! HTTP surface powered by axum.
//!
//! Thin server half for the browser client:
//! - `POST /api/ai-response`    completion proxy with filler fallback
//! - `GET  /api/test-openai`    one fixed round-trip against the service
//! - `POST /api/verify-world-id` human verification stub
//! - `GET  /api/health`          health check

mod routes;
pub mod types;

pub use routes::{ApiState, build_router, start_server};
