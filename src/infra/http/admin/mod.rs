mod cache;
mod entries;
mod models;
mod social_links;
mod state;

pub use state::AdminState;

use axum::{
    Router,
    extract::State,
    middleware,
    response::Response,
    routing::{get, patch, post},
};

use super::db_health_response;
use super::middleware::{log_responses, set_request_context};

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route(
            "/admin/api/social-links",
            get(social_links::list).post(social_links::create),
        )
        .route(
            "/admin/api/social-links/{id}",
            patch(social_links::update).delete(social_links::delete),
        )
        .route(
            "/admin/api/modules/{module}/entries",
            post(entries::create),
        )
        .route(
            "/admin/api/entries/{id}",
            patch(entries::update).delete(entries::delete),
        )
        .route("/admin/api/cache", get(cache::status))
        .route("/admin/api/cache/{module}/purge", post(cache::purge))
        .route("/_health/db", get(admin_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn admin_health(State(state): State<AdminState>) -> Response {
    db_health_response(state.db.as_ref()).await
}
