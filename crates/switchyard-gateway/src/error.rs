use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use switchyard_core::{Failure, SwitchyardError};
use tracing::warn;

/// A [`SwitchyardError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub SwitchyardError);

impl From<SwitchyardError> for ApiError {
    fn from(err: SwitchyardError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &SwitchyardError) -> StatusCode {
    match err {
        SwitchyardError::InvalidRequest(_)
        | SwitchyardError::Json(_)
        | SwitchyardError::DimensionMismatch { .. } => StatusCode::BAD_REQUEST,
        SwitchyardError::NoAgentForRole(_) | SwitchyardError::UnknownTask(_) => {
            StatusCode::NOT_FOUND
        }
        SwitchyardError::NoOrchestratorConfigured => StatusCode::SERVICE_UNAVAILABLE,
        SwitchyardError::NormalizationFailed(_)
        | SwitchyardError::DispatchFailed { .. }
        | SwitchyardError::Remote { .. }
        | SwitchyardError::Tool(_)
        | SwitchyardError::Http(_) => StatusCode::BAD_GATEWAY,
        SwitchyardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        SwitchyardError::Store(_) | SwitchyardError::Config(_) | SwitchyardError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        warn!(status = status.as_u16(), kind = self.0.kind(), error = %self.0, "Request failed");
        (status, Json(Failure::from(&self.0))).into_response()
    }
}
