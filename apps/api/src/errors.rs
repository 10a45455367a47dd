use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            // LLM failures are shown to the user verbatim; they carry the diagnostics.
            AppError::Llm(e) => {
                let (status, code) = match e {
                    LlmError::MissingCredential { .. }
                    | LlmError::InvalidCredentialFormat { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "LLM_NOT_CONFIGURED")
                    }
                    LlmError::Upstream(_) => (StatusCode::BAD_GATEWAY, "LLM_UPSTREAM_ERROR"),
                    LlmError::AllModelsUnavailable { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "LLM_UNAVAILABLE")
                    }
                    LlmError::DeadlineExceeded { .. } => {
                        (StatusCode::GATEWAY_TIMEOUT, "LLM_TIMEOUT")
                    }
                    LlmError::Extract(_) | LlmError::UnexpectedShape(_) => {
                        (StatusCode::BAD_GATEWAY, "LLM_MALFORMED_OUTPUT")
                    }
                };
                (status, code, e.to_string())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Llm(e) => tracing::error!("LLM error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::Validation(_) | AppError::PayloadTooLarge(_) => {}
        }

        let (status, code, message) = self.parts();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::extract::ExtractError;

    #[test]
    fn test_llm_errors_keep_their_message() {
        let err = AppError::from(LlmError::MissingCredential {
            key: "OPENROUTER_API_KEY",
            gemini_key_found: false,
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "LLM_NOT_CONFIGURED");
        assert!(message.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn test_status_mapping() {
        let unavailable = AppError::from(LlmError::AllModelsUnavailable {
            attempted: 2,
            last_error: None,
        });
        assert_eq!(unavailable.parts().0, StatusCode::SERVICE_UNAVAILABLE);

        let malformed = AppError::from(LlmError::Extract(ExtractError::NoJsonFound));
        assert_eq!(malformed.parts().0, StatusCode::BAD_GATEWAY);
        assert_eq!(malformed.parts().1, "LLM_MALFORMED_OUTPUT");

        let invalid = AppError::Validation("role is required".to_string());
        assert_eq!(invalid.parts().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_are_hidden() {
        let err = AppError::Internal(anyhow::anyhow!("disk on fire"));
        assert!(!err.parts().2.contains("disk"));
    }
}
