//! Page CRUD, lifecycle transitions and revision management.
//!
//! Thin handlers only: every rule lives in the engine. The AI chat editor
//! and the manual page builder both write through the same PATCH handler.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use pagewright_core::document::model::{Page, PageRevision};
use pagewright_core::engine::{CreatePage, PageFilter, UpdatePage};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/pages", get(list_pages).post(create_page))
        .route(
            "/v1/pages/{id}",
            get(get_page).patch(update_page).delete(delete_page),
        )
        .route("/v1/pages/{id}/publish", post(publish_page))
        .route("/v1/pages/{id}/unpublish", post(unpublish_page))
        .route("/v1/pages/{id}/schedule", post(schedule_page))
        .route("/v1/pages/{id}/revisions", get(list_revisions))
        .route(
            "/v1/pages/{id}/revisions/{revision_id}/restore",
            post(restore_revision),
        )
}

async fn list_pages(
    State(state): State<AppState>,
    Query(filter): Query<PageFilter>,
) -> ApiResult<Json<Vec<Page>>> {
    Ok(Json(state.engine().get_pages(&filter).await?))
}

async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<CreatePage>,
) -> ApiResult<(StatusCode, Json<Page>)> {
    let page = state.engine().create_page(input).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Page>> {
    Ok(Json(state.engine().get_page(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePageRequest {
    #[serde(flatten)]
    patch: UpdatePage,
    #[serde(default)]
    change_description: Option<String>,
}

async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePageRequest>,
) -> ApiResult<Json<Page>> {
    let page = state
        .engine()
        .update_page(id, request.patch, request.change_description.as_deref())
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletePageParams {
    #[serde(default)]
    redirect_to: Option<Uuid>,
}

async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeletePageParams>,
) -> ApiResult<StatusCode> {
    state.engine().delete_page(id, params.redirect_to).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Page>> {
    Ok(Json(state.engine().publish_page(id).await?))
}

async fn unpublish_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Page>> {
    Ok(Json(state.engine().unpublish_page(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest {
    publish_at: DateTime<Utc>,
}

async fn schedule_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Json<Page>> {
    Ok(Json(state.engine().schedule_page(id, request.publish_at).await?))
}

async fn list_revisions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PageRevision>>> {
    Ok(Json(state.engine().get_page_revisions(id).await?))
}

async fn restore_revision(
    State(state): State<AppState>,
    Path((id, revision_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Page>> {
    Ok(Json(state.engine().restore_revision(id, revision_id).await?))
}
