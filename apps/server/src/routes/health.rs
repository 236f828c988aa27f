use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    database: bool,
}

/// Liveness plus a database round trip. 503 when the database is unreachable.
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (code, Json(Health { status, database }))
}
