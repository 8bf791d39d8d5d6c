use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use crate::api_types::ApiErrorResponse;
use crate::models::workflow::{Ineligible, TransitionError};

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Hash(String),
    NotFound,
    Unauthorized,
    PermissionDenied(String),
    Session(String),
    Validation(Vec<String>),
    Ineligible(Ineligible),
    Transition(TransitionError),
    Conflict(String),
    RateLimited,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Unauthorized => write!(f, "Not logged in"),
            AppError::PermissionDenied(what) => write!(f, "Permission denied: {what}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::Ineligible(reason) => write!(f, "Not eligible: {reason}"),
            AppError::Transition(e) => write!(f, "Invalid transition: {e}"),
            AppError::Conflict(e) => write!(f, "Conflict: {e}"),
            AppError::RateLimited => write!(f, "Too many attempts"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Ineligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Transition(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Db(_) | AppError::Hash(_) | AppError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::NotFound => ApiErrorResponse::new("Not found"),
            AppError::Unauthorized => ApiErrorResponse::new("Not logged in"),
            AppError::PermissionDenied(what) => {
                ApiErrorResponse::new("Permission denied").with_details(serde_json::json!(what))
            }
            AppError::Validation(errors) => {
                ApiErrorResponse::new("Validation failed").with_details(serde_json::json!(errors))
            }
            AppError::Ineligible(reason) => ApiErrorResponse::new(reason.to_string())
                .with_details(serde_json::to_value(reason).unwrap_or_default()),
            AppError::Transition(e) => ApiErrorResponse::new(e.to_string()),
            AppError::Conflict(e) => ApiErrorResponse::new(e.clone()),
            AppError::RateLimited => {
                ApiErrorResponse::new("Too many failed login attempts. Please try again later.")
            }
            AppError::Db(_) | AppError::Hash(_) | AppError::Session(_) => {
                log::error!("{self}");
                ApiErrorResponse::new("Internal Server Error")
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::Conflict("Record already exists".to_string());
            }
        }
        AppError::Db(e)
    }
}

impl From<Ineligible> for AppError {
    fn from(e: Ineligible) -> Self {
        AppError::Ineligible(e)
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::Transition(e)
    }
}
