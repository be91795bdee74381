use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

use crate::queue::QueueError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to hash password")]
    PasswordHash,

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Database error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Record already exists".to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PasswordHash | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Queue(err) => match err {
                QueueError::BusinessNotFound | QueueError::EntryNotFound => StatusCode::NOT_FOUND,
                QueueError::NotOwner => StatusCode::FORBIDDEN,
                QueueError::AlreadyQueued
                | QueueError::CapacityReached { .. }
                | QueueError::NumberTaken
                | QueueError::InvalidTransition { .. } => StatusCode::CONFLICT,
                QueueError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        tracing::Span::current().record("error", tracing::field::display(&self));
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_conflicts_map_to_409() {
        for err in [
            QueueError::AlreadyQueued,
            QueueError::NumberTaken,
            QueueError::CapacityReached { capacity: 3 },
        ] {
            assert_eq!(AppError::from(err).status(), StatusCode::CONFLICT);
        }
        assert_eq!(
            AppError::from(QueueError::NotOwner).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn plain_database_failures_are_server_errors() {
        let err = QueueError::from(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, QueueError::Database(_)));
        assert_eq!(
            AppError::from(err).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
