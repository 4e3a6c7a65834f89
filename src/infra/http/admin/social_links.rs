use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use portico_api_types::{SocialLinkCreateRequest, SocialLinkUpdateRequest};
use uuid::Uuid;

use crate::application::admin::social_links::{CreateSocialLinkCommand, UpdateSocialLinkCommand};

use super::super::error::{ApiError, admin_write_to_api};
use super::AdminState;
use super::models::social_link_response;

pub(super) async fn list(State(state): State<AdminState>) -> Result<impl IntoResponse, ApiError> {
    let links = state
        .social_links
        .list()
        .await
        .map_err(admin_write_to_api)?;

    Ok(Json(
        links
            .into_iter()
            .map(social_link_response)
            .collect::<Vec<_>>(),
    ))
}

pub(super) async fn create(
    State(state): State<AdminState>,
    Json(payload): Json<SocialLinkCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateSocialLinkCommand {
        platform: payload.platform,
        url: payload.url,
        sort_order: payload.sort_order,
        visible: payload.visible,
    };

    let link = state
        .social_links
        .create(command)
        .await
        .map_err(admin_write_to_api)?;

    Ok((StatusCode::CREATED, Json(social_link_response(link))))
}

pub(super) async fn update(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SocialLinkUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateSocialLinkCommand {
        platform: payload.platform,
        url: payload.url,
        sort_order: payload.sort_order,
        visible: payload.visible,
    };

    let link = state
        .social_links
        .update(id, command)
        .await
        .map_err(admin_write_to_api)?;

    Ok(Json(social_link_response(link)))
}

pub(super) async fn delete(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .social_links
        .delete(id)
        .await
        .map_err(admin_write_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
