use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use portico_api_types::{EntryCreateRequest, EntryUpdateRequest};
use uuid::Uuid;

use crate::application::admin::entries::{CreateEntryCommand, UpdateEntryCommand};
use crate::cache::Module;

use super::super::error::{ApiError, admin_write_to_api};
use super::AdminState;
use super::models::entry_response;

pub(super) async fn create(
    State(state): State<AdminState>,
    Path(key): Path<String>,
    Json(payload): Json<EntryCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let module = Module::from_str(&key)?;
    let command = CreateEntryCommand {
        title: payload.title,
        body: payload.body,
        position: payload.position,
        published: payload.published,
    };

    let entry = state
        .entries
        .create(module, command)
        .await
        .map_err(admin_write_to_api)?;

    Ok((StatusCode::CREATED, Json(entry_response(entry))))
}

pub(super) async fn update(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EntryUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateEntryCommand {
        title: payload.title,
        body: payload.body,
        position: payload.position,
        published: payload.published,
    };

    let entry = state
        .entries
        .update(id, command)
        .await
        .map_err(admin_write_to_api)?;

    Ok(Json(entry_response(entry)))
}

pub(super) async fn delete(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.entries.delete(id).await.map_err(admin_write_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
