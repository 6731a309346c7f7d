//! HTTP projection of the service error taxonomy.
//!
//! Handlers return [`ApiError`]; every error response carries the status code, its reason
//! phrase, a human-readable message and the correlation id that was logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use customers_core::errors::{ApplicationError, InterfaceError, ValidationError};
use customers_db::RepositoryError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    pub fn new(error: InterfaceError) -> Self {
        Self(error.with_correlation_id(Uuid::new_v4().to_string()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(InterfaceError::not_found(message))
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(InterfaceError::method_not_allowed(message))
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(InterfaceError::unsupported_media_type(message))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(InterfaceError::bad_request(message))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            InterfaceError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn interface(&self) -> &InterfaceError {
        &self.0
    }
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self(value.into_interface(Uuid::new_v4().to_string()))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        Self::from(ApplicationError::from(value))
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::from(ApplicationError::from(value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let interface = self.0;

        if status.is_server_error() {
            // Storage details stay in the log; clients get the generic wording.
            error!(
                event_name = "http.request.failed",
                correlation_id = interface.correlation_id(),
                status = status.as_u16(),
                error = %interface,
                "request failed"
            );
        } else {
            warn!(
                event_name = "http.request.rejected",
                correlation_id = interface.correlation_id(),
                status = status.as_u16(),
                error = %interface,
                "request rejected"
            );
        }

        let message = if status.is_server_error() {
            interface.user_message().to_string()
        } else {
            interface.message().to_string()
        };

        let body = ErrorBody {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            correlation_id: interface.correlation_id().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
