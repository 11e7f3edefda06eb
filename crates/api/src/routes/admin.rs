//! Supporting admin surfaces: team members, categories, site config and the
//! block palette the editor UI builds its insert menu from.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use pagewright_core::document::model::{Category, Site, TeamMember};
use pagewright_core::engine::{CreateTeamMember, UpdateTeamMember};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/team", get(list_team).post(create_team_member))
        .route(
            "/v1/team/{id}",
            get(get_team_member)
                .patch(update_team_member)
                .delete(delete_team_member),
        )
        .route("/v1/categories", get(list_categories).post(create_category))
        .route("/v1/categories/{id}", axum::routing::delete(delete_category))
        .route("/v1/site", get(get_site).put(update_site))
        .route("/v1/blocks", get(list_blocks))
}

async fn list_team(State(state): State<AppState>) -> ApiResult<Json<Vec<TeamMember>>> {
    Ok(Json(state.engine().get_team_members().await?))
}

async fn get_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.engine().get_team_member(id).await?))
}

async fn create_team_member(
    State(state): State<AppState>,
    Json(input): Json<CreateTeamMember>,
) -> ApiResult<(StatusCode, Json<TeamMember>)> {
    let member = state.engine().create_team_member(input).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateTeamMember>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.engine().update_team_member(id, patch).await?))
}

async fn delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.engine().delete_team_member(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.engine().get_categories().await?))
}

#[derive(Debug, Deserialize)]
struct CreateCategoryRequest {
    name: String,
    slug: String,
}

async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state
        .engine()
        .create_category(&request.name, &request.slug)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.engine().delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_site(State(state): State<AppState>) -> ApiResult<Json<Site>> {
    Ok(Json(state.engine().get_site().await?))
}

async fn update_site(
    State(state): State<AppState>,
    Json(site): Json<Site>,
) -> ApiResult<Json<Site>> {
    Ok(Json(state.engine().update_site(site).await?))
}

/// Block definitions for the editor's insert menu.
async fn list_blocks(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.engine().blocks().all()))
}
