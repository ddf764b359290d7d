use actix_web::{http::StatusCode, ResponseError};
use log::error;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::response::response_from_error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{msg}")]
    Validation { keys: Vec<String>, msg: String },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn validation(keys: Vec<String>, msg: impl Into<String>) -> Self {
        Self::Validation { keys, msg: msg.into() }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    /// Collapses database errors to the public taxonomy. Known constraint
    /// violations become 400, everything else is logged and becomes 500.
    pub fn from_db(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::bad_request("duplicate key"),
            _ => {
                error!("database failure: {}", err);
                Self::Internal
            }
        }
    }

    pub fn validation_keys(&self) -> Option<&[String]> {
        match self {
            Self::Validation { keys, .. } => Some(keys),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        response_from_error(self)
    }
}
