use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image_processing::DecodeError;
use crate::provider::{Operation, ProviderError};

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request body or image payload
    #[error("{message}")]
    BadRequest { message: String },

    /// Refine requested for a cache id that is unknown or past its retention window
    #[error("image session not found or expired")]
    SessionExpired,

    /// The generation provider failed, timed out or returned unusable output
    #[error("{operation} failed: {source}")]
    Provider {
        operation: Operation,
        #[source]
        source: ProviderError,
    },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
        }
    }

    pub fn provider(operation: Operation) -> impl FnOnce(ProviderError) -> Self {
        move |source| AppError::Provider { operation, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::SessionExpired => StatusCode::GONE,
            AppError::Provider { source, .. } => match source {
                ProviderError::NoValidImages => StatusCode::BAD_REQUEST,
                ProviderError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients; provider output is never echoed.
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest { message } => message.clone(),
            AppError::SessionExpired => {
                "Image session expired or not found. Please generate a new cutout to start again."
                    .to_string()
            }
            AppError::Provider { operation, source } => match source {
                ProviderError::NoValidImages => "No valid images provided".to_string(),
                ProviderError::Timeout { .. } => {
                    format!("AI provider timed out during {operation}")
                }
                _ => format!("AI provider failed during {operation}"),
            },
            AppError::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::bad_request(format!("Invalid image: {err}"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Other(_) => tracing::error!("Internal service error: {:#}", self),
            AppError::Provider { .. } => tracing::error!("Provider error: {}", self),
            AppError::SessionExpired | AppError::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self)
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn provider_errors_map_to_gateway_statuses() {
        let timeout = AppError::provider(Operation::Avatar)(ProviderError::Timeout {
            operation: Operation::Avatar,
            budget: Duration::from_secs(90),
        });
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.user_message(), "AI provider timed out during avatar");

        let missing = AppError::provider(Operation::Cutout)(ProviderError::NoImage);
        assert_eq!(missing.status_code(), StatusCode::BAD_GATEWAY);

        let off = AppError::provider(Operation::Analyze)(ProviderError::OffVocabulary {
            field: "category",
            value: "T-Shirt".to_string(),
        });
        assert_eq!(off.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!off.user_message().contains("T-Shirt"));

        let empty = AppError::provider(Operation::Collage)(ProviderError::NoValidImages);
        assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_text_is_not_exposed() {
        let err = AppError::provider(Operation::Analyze)(ProviderError::Api(
            "internal model detail".to_string(),
        ));
        assert!(!err.user_message().contains("internal model detail"));
        assert!(err.to_string().contains("internal model detail"));
    }

    #[test]
    fn session_expired_is_a_client_error() {
        assert_eq!(AppError::SessionExpired.status_code(), StatusCode::GONE);
        assert!(AppError::SessionExpired.user_message().contains("generate a new cutout"));
    }
}
