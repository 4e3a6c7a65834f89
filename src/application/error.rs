use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::repos::RepoError, cache::CacheSetupError, domain::error::DomainError,
    infra::error::InfraError,
};

/// Diagnostic detail attached to error responses and emitted by the response
/// logging middleware. Never sent to clients.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    CacheSetup(#[from] CacheSetupError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(_) => StatusCode::BAD_REQUEST,
            AppError::Repo(RepoError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Repo(RepoError::Timeout) | AppError::Infra(InfraError::Database { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Repo(_)
            | AppError::Infra(_)
            | AppError::CacheSetup(_)
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(_) => "Request could not be processed",
            AppError::Repo(RepoError::NotFound) => "Resource not found",
            AppError::Repo(RepoError::Timeout) | AppError::Infra(InfraError::Database { .. }) => {
                "Service temporarily unavailable"
            }
            AppError::CacheSetup(_) | AppError::Infra(InfraError::Configuration { .. }) => {
                "Service misconfigured"
            }
            AppError::Repo(_) | AppError::Infra(_) | AppError::Unexpected(_) => {
                "Unexpected error occurred"
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_collects_error_chain() {
        let err = AppError::Infra(InfraError::database("pool timed out"));
        let report = ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &err);
        assert_eq!(report.messages[0], "database error: pool timed out");
    }

    #[test]
    fn database_failures_map_to_503() {
        let response = AppError::Infra(InfraError::database("down")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }

    #[test]
    fn missing_record_maps_to_404() {
        let response = AppError::Repo(RepoError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
