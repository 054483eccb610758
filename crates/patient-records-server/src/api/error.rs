//! Mapping of store failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use patient_records_core::{FieldViolation, StoreError};
use serde::Serialize;
use std::sync::PoisonError;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<Vec<FieldViolation>>,
}

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    BadRequest(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl<T> From<PoisonError<T>> for ApiError {
    fn from(err: PoisonError<T>) -> Self {
        ApiError::Internal(format!("Store lock poisoned: {}", err))
    }
}

impl ApiError {
    fn status_and_body(self) -> (StatusCode, ErrorResponse) {
        let (status, error, details) = match self {
            ApiError::Store(StoreError::Validation(err)) => (
                StatusCode::BAD_REQUEST,
                "Invalid patient record".to_string(),
                Some(err.violations().to_vec()),
            ),
            ApiError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Patient not found".to_string(), None)
            }
            ApiError::Store(StoreError::Conflict(_)) => (
                StatusCode::BAD_REQUEST,
                "Patient already exists".to_string(),
                None,
            ),
            ApiError::Store(
                err @ (StoreError::InvalidSortField(_) | StoreError::InvalidSortOrder(_)),
            ) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            ApiError::Store(StoreError::Storage(err)) => {
                error!(error = %err, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
        };
        (status, ErrorResponse { error, details })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patient_records_core::{StorageError, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(StoreError::Validation(ValidationError::single(
                    "age",
                    "must be greater than 0",
                ))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(StoreError::NotFound("P1".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(StoreError::Conflict("P1".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(StoreError::InvalidSortField("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(StoreError::InvalidSortOrder("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(StoreError::Storage(StorageError::Corrupt("eof".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_and_body().0, expected);
        }
    }

    #[test]
    fn test_validation_details() {
        let err = ApiError::from(StoreError::Validation(ValidationError::single(
            "email",
            "invalid email address",
        )));
        let (_, body) = err.status_and_body();
        let details = body.details.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "email");
        assert_eq!(details[0].reason, "invalid email address");
    }

    #[test]
    fn test_not_found_has_no_details() {
        let (_, body) = ApiError::from(StoreError::NotFound("P9".into())).status_and_body();
        assert_eq!(body.error, "Patient not found");
        assert!(body.details.is_none());
    }
}
