use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use portico_api_types::CacheStatusResponse;
use tracing::info;

use crate::cache::{Module, PurgeOutcome};

use super::super::error::{ApiError, store_to_api};
use super::AdminState;
use super::models::snapshot_status;

pub(super) async fn status(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let modules = state.cache.inspect_all().await.map_err(store_to_api)?;

    Ok(Json(CacheStatusResponse {
        modules: modules.into_iter().map(snapshot_status).collect(),
    }))
}

/// Purges only the named module; fan-out is reserved for content writes.
pub(super) async fn purge(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let module = Module::from_str(&key)?;
    let outcome = state.cache.purge(module).await;
    if outcome == PurgeOutcome::Purged {
        info!(module = module.as_str(), "Snapshot purged by operator");
    }
    Ok(StatusCode::NO_CONTENT)
}
