use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use recovery_core::{QueryError, ValidationError};
use recovery_storage::{CaseError, ClientError};

/// RFC 7807 body returned for every failed request.
#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
                field: None,
            },
        }
    }

    fn with_field(mut self, field: &'static str) -> Self {
        self.body.field = Some(field);
        self
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("{detail}")]
    Rejected {
        status: StatusCode,
        problem_type: &'static str,
        detail: String,
    },
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Short label used for the `result` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Query(_) => "validation",
            Self::Rejected { .. } => "rejected",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Query(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Rejected { status, .. } => *status,
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let problem = match self {
            Self::Validation(err) => {
                ProblemResponse::new(status, "validation_error", err.to_string())
                    .with_field(err.field)
            }
            Self::Query(err) => ProblemResponse::new(status, "invalid_query", err.to_string())
                .with_field(err.parameter()),
            Self::Rejected {
                problem_type,
                detail,
                ..
            } => ProblemResponse::new(status, problem_type, detail),
            Self::Conflict(detail) => ProblemResponse::new(status, "conflict", detail),
            Self::NotFound(detail) => ProblemResponse::new(status, "not_found", detail),
            Self::Internal(detail) => {
                error!(stage = "api", error = %detail, "request failed");
                ProblemResponse::new(status, "internal_error", "internal server error")
            }
        };
        problem.into_response()
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::EmailTaken => Self::Conflict("Email already exists"),
            ClientError::Database(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<CaseError> for ApiError {
    fn from(err: CaseError) -> Self {
        match err {
            CaseError::NotFound => Self::NotFound("Case not found"),
            CaseError::ClientNotFound => Self::NotFound("Client not found"),
            CaseError::DuplicateInvoiceNumber => Self::Conflict("Invoice number already exists"),
            other @ (CaseError::Decode(_) | CaseError::Database(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            problem_type: "invalid_body",
            detail: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            problem_type: "invalid_path",
            detail: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            problem_type: "invalid_query",
            detail: rejection.body_text(),
        }
    }
}
