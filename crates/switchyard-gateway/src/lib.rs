//! HTTP gateway for Switchyard.
//!
//! Serves the vector bus contract (`/healthz`, `/embed`, `/vectors`,
//! `/query`, `/dot`) under a configurable prefix, plus `POST /route` and
//! `GET /agents` for the routing fabric. Failures are answered with a
//! non-2xx status and a `{kind, message, details?}` body.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use middleware::AuthConfig;
pub use server::{AppState, GatewayServer};
