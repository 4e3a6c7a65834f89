//! HTTP surface: the public content API and the admin API, each served on its
//! own listener.

mod admin;
mod error;
mod middleware;
mod public;

pub use admin::{AdminState, build_admin_router};
pub use error::{ApiError, ApiErrorBody, ApiErrorMessage, codes};
pub use middleware::REQUEST_ID_HEADER;
pub use public::{HttpState, build_router};

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::infra::db::PostgresRepositories;

/// 204 when the database answers, 503 otherwise. Without a configured database
/// the in-process stores are always reachable.
async fn db_health_response(db: Option<&Arc<PostgresRepositories>>) -> Response {
    let Some(db) = db else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
