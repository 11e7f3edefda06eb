//! Public-facing resolution surfaces: path → page lookup for the render
//! layer, the full redirect map for routing middleware, static paths for
//! the site generator, and the sweep trigger hit by an external cron.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use pagewright_core::engine::{ResolvedPage, ResolvedRedirect, StaticPath, SweepReport};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/resolve", get(resolve))
        .route("/v1/resolve/published", get(resolve_published))
        .route("/v1/redirects", get(redirects))
        .route("/v1/static-paths", get(static_paths))
        .route("/v1/scheduled/process", post(process_scheduled))
}

#[derive(Debug, Deserialize)]
struct ResolveParams {
    /// Path without leading slash; empty or absent means the homepage.
    #[serde(default)]
    path: String,
    locale: String,
}

async fn resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> ApiResult<Json<ResolvedPage>> {
    let resolved = state
        .engine()
        .get_page_by_path(&params.path, &params.locale)
        .await?;
    Ok(Json(resolved))
}

async fn resolve_published(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> ApiResult<Json<ResolvedPage>> {
    let resolved = state
        .engine()
        .get_published_page(&params.path, &params.locale)
        .await?;
    Ok(Json(resolved))
}

async fn redirects(State(state): State<AppState>) -> ApiResult<Json<Vec<ResolvedRedirect>>> {
    Ok(Json(state.engine().get_redirects().await?))
}

async fn static_paths(State(state): State<AppState>) -> ApiResult<Json<Vec<StaticPath>>> {
    Ok(Json(state.engine().get_static_page_paths().await?))
}

/// Promote due scheduled content. The engine has no internal clock; an
/// external timer (cron) hits this endpoint periodically.
async fn process_scheduled(State(state): State<AppState>) -> ApiResult<Json<SweepReport>> {
    let report = state.engine().process_scheduled_content(Utc::now()).await?;
    Ok(Json(report))
}
