use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::admin::AdminWriteError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::cache::{StoreError, UnknownModule};
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const UNKNOWN_MODULE: &str = "unknown_module";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const NOT_ENTRY_BACKED: &str = "not_entry_backed";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

impl From<UnknownModule> for ApiError {
    fn from(err: UnknownModule) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            codes::UNKNOWN_MODULE,
            "Unknown content module",
            Some(err.0),
        )
    }
}

pub(super) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation { field, message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(format!("{field}: {message}")),
        ),
        DomainError::NotEntryBacked { module } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::NOT_ENTRY_BACKED,
            "Module does not hold entries",
            Some(module),
        ),
    }
}

pub(super) fn admin_write_to_api(err: AdminWriteError) -> ApiError {
    match err {
        AdminWriteError::Domain(domain) => domain_to_api(domain),
        AdminWriteError::Repo(repo) => repo_to_api(repo),
    }
}

pub(super) fn store_to_api(err: StoreError) -> ApiError {
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        codes::STORE_UNAVAILABLE,
        "Snapshot store unavailable",
        Some(err.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_module_is_not_found() {
        let err: ApiError = UnknownModule("weather".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let response = err.into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("error report attached");
        assert_eq!(report.messages[0], "unknown_module: weather");
    }

    #[test]
    fn duplicate_maps_to_conflict() {
        let err = admin_write_to_api(AdminWriteError::Repo(RepoError::Duplicate {
            constraint: "social_links_platform_key".into(),
        }));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = admin_write_to_api(AdminWriteError::Domain(DomainError::validation(
            "url",
            "must use http or https",
        )));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
