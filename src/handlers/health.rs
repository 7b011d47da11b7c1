use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::database::Database;
use crate::state::AppState;

/// GET /health - liveness plus database reachability. Exempt from auth and
/// rate limiting so probes stay cheap.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match Database::health_check(&state.config.database).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "code": 200,
                "message": "ok",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("health check degraded: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "code": 503,
                    "message": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unreachable",
                    }
                })),
            )
        }
    }
}
