//! Shared error taxonomy, mapped to HTTP responses at the edge.
//!
//! Every handler returns `Result<_, AppError>`; `AppError` carries its own
//! status code and message and implements `IntoResponse` directly, with a
//! flat `{"message": "..."}` body.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP 400 Bad Request")]
    BadRequest(String),

    #[error("HTTP 401 Unauthorized")]
    Unauthorized,

    #[error("HTTP 402 Payment Required")]
    NotEnoughFunds,

    #[error("HTTP 422 Unprocessable Entity")]
    UnprocessableEntity(String),

    #[error("HTTP 200 You Have Already Uploaded The Order")]
    AlreadyOwnedBySame,

    #[error("HTTP 409 The Order Has Already Been Uploaded By Another User")]
    AlreadyOwnedByOther,

    #[error("HTTP 409 Login Already Exists")]
    LoginTaken,

    #[error("HTTP 500 Internal Server Error")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotEnoughFunds => StatusCode::PAYMENT_REQUIRED,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AlreadyOwnedBySame => StatusCode::OK,
            AppError::AlreadyOwnedByOther => StatusCode::CONFLICT,
            AppError::LoginTaken => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::UnprocessableEntity(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if matches!(self, AppError::Internal(_)) {
            tracing::error!(error = %self, "internal error");
        }
        let status = self.status();
        let body = Json(ErrorBody { message: self.message() });
        (status, body).into_response()
    }
}

impl From<crate::db::StoreError> for AppError {
    fn from(err: crate::db::StoreError) -> Self {
        use crate::db::StoreError as S;
        match err {
            S::LoginTaken => AppError::LoginTaken,
            S::Unauthorized => AppError::Unauthorized,
            S::AlreadyOwnedBySame => AppError::AlreadyOwnedBySame,
            S::AlreadyOwnedByOther => AppError::AlreadyOwnedByOther,
            S::InsufficientFunds => AppError::NotEnoughFunds,
            S::Internal(msg) => AppError::Internal(msg),
        }
    }
}
