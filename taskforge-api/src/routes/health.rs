/// Health check endpoint
///
/// `GET /health` is the one unauthenticated route. It always answers 200,
/// downgrading `status` to `degraded` when the store probe fails, so a
/// load balancer can tell "process up, store down" apart from "process
/// gone".

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

/// Store reachability as seen by the probe query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

/// Health check response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseStatus,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => DatabaseStatus::Connected,
        Err(_) => DatabaseStatus::Disconnected,
    };

    Json(HealthResponse {
        status: match database {
            DatabaseStatus::Connected => "healthy",
            DatabaseStatus::Disconnected => "degraded",
        },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_status_serializes_snake_case() {
        let degraded = serde_json::to_value(HealthResponse {
            status: "degraded",
            version: "0.0.0",
            database: DatabaseStatus::Disconnected,
        })
        .unwrap();
        assert_eq!(degraded["database"], "disconnected");
        assert_eq!(degraded["status"], "degraded");
    }
}
