//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the
//! application. It centralizes error management so that every failure, from
//! authentication problems to database errors, is represented consistently
//! and translated into a structured JSON response at the request boundary.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can
//! simply return `Result<_, AppError>` and rely on the `?` operator, with
//! `From` implementations covering `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, and `bcrypt::BcryptError`.
//!
//! Every error body has the shape `{"success": false, "error": <message>}`.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or was missing (HTTP 401).
    Unauthorized(String),
    /// The caller is authenticated but not allowed to act on this resource (HTTP 403).
    Forbidden(String),
    /// Malformed or invalid request: duplicate email, invalid status,
    /// self-deletion attempts (HTTP 400).
    BadRequest(String),
    /// A requested resource does not exist (HTTP 404).
    NotFound(String),
    /// An unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// An error originating from the database layer (HTTP 500).
    /// The message is never forwarded to the client.
    DatabaseError(String),
    /// Input failed validation rules (HTTP 422).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Database and internal errors are collapsed into a generic message so no
/// internal detail leaks to the caller; the original error is logged instead.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "success": false,
                "error": msg
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "success": false,
                "error": msg
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "success": false,
                "error": msg
            })),
            AppError::InternalServerError(msg) => {
                log::error!("internal error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "success": false,
                    "error": "Server error"
                }))
            }
            AppError::DatabaseError(msg) => {
                log::error!("database error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "success": false,
                    "error": "Server error"
                }))
            }
            AppError::ValidationError(msg) => HttpResponse::UnprocessableEntity().json(json!({
                "success": false,
                "error": msg
            })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound`. A unique-constraint violation maps to
/// `BadRequest`: the `accounts.email` UNIQUE index is the real enforcement of
/// email uniqueness, so a lost check-then-insert race still surfaces as the
/// duplicate-email error rather than a 500.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Email is already in use".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// JWT processing failures are authentication failures as far as the caller
/// is concerned, whatever the underlying cause.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
