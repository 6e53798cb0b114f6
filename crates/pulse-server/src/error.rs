use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pulse_core::VerifyError;
use serde_json::json;
use thiserror::Error;

use crate::sync::SyncError;

/// Request-level failure taxonomy. Both signature failure modes collapse
/// into one variant so callers cannot distinguish a missing hash from a
/// wrong one.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing initData")]
    MissingData,
    #[error("Malformed initData")]
    MalformedPayload,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Missing user in initData")]
    MissingUser,
    #[error("Invalid user JSON")]
    InvalidUserData,
    #[error("Missing user_id or bpm")]
    MissingPrefs,
    #[error("Invalid user_id or bpm")]
    InvalidPrefs,
    #[error("Unknown user")]
    UnknownUser,
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingData
            | AppError::MalformedPayload
            | AppError::MissingUser
            | AppError::InvalidUserData
            | AppError::MissingPrefs
            | AppError::InvalidPrefs => StatusCode::BAD_REQUEST,
            AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::UnknownUser => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::MalformedPayload => AppError::MalformedPayload,
            VerifyError::InvalidSignature => AppError::InvalidSignature,
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::MissingUser => AppError::MissingUser,
            SyncError::InvalidUserData(_) => AppError::InvalidUserData,
            SyncError::Store(_) => AppError::Internal,
        }
    }
}
