use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check — verifies the document store is readable.
async fn health_check(State(state): State<AppState>) -> crate::error::ApiResult<Json<Value>> {
    let site = state.engine().get_site().await?;

    Ok(Json(json!({
        "status": "ok",
        "site": site.name,
        "subscribers": state.engine().events().subscriber_count(),
    })))
}

/// Lightweight ping — no store access.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
