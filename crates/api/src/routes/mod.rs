pub mod admin;
pub mod health;
pub mod pages;
pub mod posts;
pub mod resolve;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(pages::routes())
        .merge(posts::routes())
        .merge(resolve::routes())
        .merge(admin::routes())
        .with_state(state)
}
