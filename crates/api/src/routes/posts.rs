//! Post CRUD and lifecycle transitions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use pagewright_core::document::model::Post;
use pagewright_core::engine::{CreatePost, PostFilter, UpdatePost};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/posts", get(list_posts).post(create_post))
        .route(
            "/v1/posts/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/v1/posts/{id}/publish", post(publish_post))
        .route("/v1/posts/{id}/unpublish", post(unpublish_post))
        .route("/v1/posts/{id}/schedule", post(schedule_post))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(state.engine().get_posts(&filter).await?))
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePost>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = state.engine().create_post(input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Post>> {
    Ok(Json(state.engine().get_post(id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdatePost>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.engine().update_post(id, patch).await?))
}

async fn delete_post(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.engine().delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.engine().publish_post(id).await?))
}

async fn unpublish_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.engine().unpublish_post(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest {
    publish_at: DateTime<Utc>,
}

async fn schedule_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.engine().schedule_post(id, request.publish_at).await?))
}
