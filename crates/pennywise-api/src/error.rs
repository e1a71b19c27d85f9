//! Error types for pennywise-api

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pennywise_core::{CoreError, ErrorCode, ErrorSeverity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core(error) => match error.code() {
                ErrorCode::OperationNotFound | ErrorCode::CategoryNotFound => StatusCode::NOT_FOUND,
                ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::IoError | ErrorCode::SnapshotError => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        match self {
            ApiError::Core(error) => {
                let details = error.to_details();
                ErrorBody {
                    code: details.code.to_string(),
                    message: details.message,
                    field: details.field,
                    suggestions: details.suggestions,
                }
            }
            ApiError::BadRequest { .. } => ErrorBody {
                code: "BAD_REQUEST".to_string(),
                message: self.to_string(),
                field: None,
                suggestions: vec![],
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Core(error) if error.severity() == ErrorSeverity::Error => {
                log::error!("{}", error)
            }
            _ => log::debug!("{} ({})", self, status),
        }
        (status, Json(self.to_body())).into_response()
    }
}
