use super::AppState;
use crate::api::models::{HealthResponse, HealthStatus};
use crate::core::error::LibraryError;
use axum::{extract::State, Json};

/// Handler for GET /health
///
/// Reports `degraded` when the database does not answer a trivial query.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = state
        .db
        .execute(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(LibraryError::DatabaseError)
        })
        .await
        .is_ok();

    if !database_ok {
        tracing::warn!("Health check: database unavailable");
    }

    Json(HealthResponse {
        status: if database_ok { HealthStatus::Ok } else { HealthStatus::Degraded },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
