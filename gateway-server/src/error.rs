use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use gateway_core::GatewayError;
use gateway_protocol::http::ErrorResponse;

/// Maps a [`GatewayError`] onto the HTTP status + `{success, error, detail}`
/// body contract from spec.md §7.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            GatewayError::PathEscapesWorkspace { .. }
            | GatewayError::PathUnresolvable { .. }
            | GatewayError::InvalidEdit { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
            GatewayError::BlockedByPattern { .. } | GatewayError::OperationBlocked { .. } => {
                (StatusCode::FORBIDDEN, "blocked")
            }
            GatewayError::ParentMissing { .. } => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::ParentNotWritable { .. } => (StatusCode::FORBIDDEN, "not_writable"),
            GatewayError::FileTooLarge { .. } => (StatusCode::BAD_REQUEST, "file_too_large"),
            GatewayError::ApprovalNotFound { .. } => (StatusCode::NOT_FOUND, "approval_not_found"),
            GatewayError::ApprovalAlreadyResolved { .. } => {
                (StatusCode::CONFLICT, "approval_already_resolved")
            }
            GatewayError::CommandTimedOut { .. } => (StatusCode::OK, "timed_out"),
            GatewayError::Io { .. } | GatewayError::Index { .. } | GatewayError::Spawn { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorResponse {
            success: false,
            error: error.to_string(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
