use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db::query::QueryError;
use crate::db::DbError;

pub const LOGIN_PAGE: &str = "/login.html";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Database failure. Only `message` reaches the client.
    #[error("{message}")]
    Persistence {
        message: &'static str,
        #[source]
        source: DbError,
    },
    #[error("{0}")]
    Unauthorized(String),
    /// No authenticated admin session; answered with a redirect.
    #[error("login required")]
    LoginRequired,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Logs the underlying failure and hides it behind `message`.
    pub fn persistence(message: &'static str, source: DbError) -> Self {
        log::error!("{}: {}", message, source);
        ApiError::Persistence { message, source }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NoFields => {
                ApiError::validation("No se proporcionaron campos válidos para actualizar.")
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::LoginRequired => StatusCode::FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::LoginRequired => HttpResponse::Found()
                .insert_header((header::LOCATION, LOGIN_PAGE))
                .finish(),
            ApiError::Unauthorized(message) => HttpResponse::Unauthorized()
                .json(json!({ "success": false, "message": message })),
            _ => HttpResponse::build(self.status_code())
                .content_type(ContentType::plaintext())
                .body(self.to_string()),
        }
    }
}

/// Renders the wrapped error as `{"error": "<message>"}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct JsonError(#[from] pub ApiError);

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.0.to_string() }))
    }
}
