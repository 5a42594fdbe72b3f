use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use thiserror::Error;

use crate::entities::FeeStatus;
use crate::models::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: FeeStatus, to: FeeStatus },

    /// Contention or schema-not-ready that outlasted every retry attempt.
    #[error("Storage unavailable after {attempts} attempts: {source}")]
    TransientStorage { attempts: u32, source: DbErr },

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            AppError::TransientStorage { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
            }
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code) = self.parts();
        let message = match self {
            AppError::NotFound(msg) => msg.clone(),
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::InvalidTransition { .. } => {
                log::warn!("{self}");
                self.to_string()
            }
            AppError::TransientStorage { attempts, source } => {
                log::error!("Storage still unavailable after {attempts} attempts: {source}");
                "Storage temporarily unavailable".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            AppError::ConfigError(_) => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(status_code)
            .json(ApiResponse::<()>::error(error_code.to_string(), message))
    }
}
