use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, header::CACHE_CONTROL},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::content::ContentService;
use crate::cache::Module;
use crate::infra::db::PostgresRepositories;

use super::db_health_response;
use super::error::ApiError;
use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub content: Arc<ContentService>,
    pub db: Option<Arc<PostgresRepositories>>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/v1/content/{module}", get(module_content))
        .route("/_health/db", get(public_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Always 200 for a known module; degraded payloads are flagged in `meta`.
async fn module_content(
    State(state): State<HttpState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let module = Module::from_str(&key)?;
    let envelope = state.content.module(module).await;

    let mut response = Json(envelope).into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.as_ref()).await
}
