// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::store::value::ValueError;

/// Failures while reading a single run store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("run store not found: {0}")]
    Missing(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid value for config '{path}': {source}")]
    Config {
        path: String,
        #[source]
        source: ValueError,
    },
}

/// Errors surfaced at the HTTP boundary. Each maps to one status code and a
/// `{"error": message}` body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn run_not_found(project: &str, run: &str) -> Self {
        ApiError::NotFound(format!("Run not found: {project}/{run}"))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("request task failed: {e}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_run_not_found_names_project_and_run() {
        let err = ApiError::run_not_found("acme/widget", "run1");
        assert_eq!(err.to_string(), "Run not found: acme/widget/run1");
    }

    #[test]
    fn test_store_error_is_internal() {
        let err: ApiError = StoreError::Missing("/tmp/x.sqlite".into()).into();
        assert!(matches!(err, ApiError::Internal(ref m) if m.contains("/tmp/x.sqlite")));
    }
}
