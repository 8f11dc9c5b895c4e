use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diffsarif_core::DiffSarifError;
use serde::Serialize;
use thiserror::Error;

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// The body could not be decoded as the expected JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Validation, credential or pipeline failure.
    #[error(transparent)]
    Analysis(#[from] DiffSarifError),
}

impl AppError {
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Analysis(err) => match err {
                DiffSarifError::Validation(_) => StatusCode::BAD_REQUEST,
                DiffSarifError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
                DiffSarifError::Upstream(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Analysis(err) => match err {
                DiffSarifError::Validation(_) => "VALIDATION_ERROR",
                DiffSarifError::InvalidCredential(_) => "INVALID_KEY",
                DiffSarifError::Upstream(_) => "UPSTREAM_ERROR",
                _ => "INTERNAL_ERROR",
            },
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Analysis(DiffSarifError::Validation(msg)) => msg.clone(),
            AppError::Analysis(DiffSarifError::InvalidCredential(_)) => "Invalid key".into(),
            AppError::Analysis(err) => err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.error_code(),
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let err = AppError::from(DiffSarifError::Validation("Maximum 10 files are allowed".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.client_message(), "Maximum 10 files are allowed");
    }

    #[test]
    fn invalid_credential_maps_to_401() {
        let err = AppError::from(DiffSarifError::InvalidCredential("401 Unauthorized".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.client_message(), "Invalid key");
    }

    #[test]
    fn upstream_maps_to_502() {
        let err = AppError::from(DiffSarifError::Upstream("timeout".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn other_errors_map_to_500() {
        let err = AppError::from(DiffSarifError::Config("broken".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_carries_status() {
        let response = AppError::BadRequest("expected JSON".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
