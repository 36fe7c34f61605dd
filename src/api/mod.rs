//! REST API module
//!
//! - Author and book resource handlers
//! - Per-route guards and trace ID middleware
//! - Response shaping
//! - HTTP server with graceful shutdown

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use middleware::{trace_id_middleware, Guard, TraceId, TRACE_ID_HEADER};
pub use routes::build_api_routes;
pub use server::ApiServer;
