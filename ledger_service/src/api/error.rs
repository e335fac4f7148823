use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{ErrorKind, TransferError};
use serde_json::json;

use crate::config::Environment;

/// Unified API error wrapper — the HTTP adapter is the only place
/// `ErrorKind` turns into a status code.
pub struct ApiError {
    pub inner: TransferError,
    pub environment: Environment,
}

impl ApiError {
    pub fn new(inner: TransferError, environment: Environment) -> Self {
        Self { inner, environment }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest
        | ErrorKind::InvalidAmount
        | ErrorKind::AmountTooSmall
        | ErrorKind::InvalidWalletId
        | ErrorKind::SameWalletTransfer
        | ErrorKind::InsufficientBalance
        | ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::WalletNotFound => StatusCode::NOT_FOUND,
        ErrorKind::DuplicateRequest | ErrorKind::ConcurrentProcessing => StatusCode::CONFLICT,
        ErrorKind::TransferFailed | ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.inner.kind);

        // Production suppresses the underlying cause and uses a generic
        // message for uncategorized 500s; every other kind's message is
        // already a categorized, safe-to-show description.
        let message = if self.environment.is_production()
            && matches!(
                self.inner.kind,
                ErrorKind::InternalError | ErrorKind::TransferFailed
            ) {
            "Internal server error".to_string()
        } else {
            self.inner.message.clone()
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.inner, "request failed with an internal error");
        }

        let body = Json(json!({
            "success": false,
            "error": self.inner.kind.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
