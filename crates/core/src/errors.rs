use thiserror::Error;

use crate::domain::customer::CustomerId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid Customer: missing {0}")]
    MissingField(&'static str),
    #[error("Invalid Customer: {field} {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Invalid Customer: body of request contained bad or no data - {0}")]
    MalformedBody(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid customer status `{label}` (expected ACTIVE|SUSPENDED)")]
    InvalidStatus { label: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Customer with id '{0}' was not found.")]
    NotFound(CustomerId),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

impl From<ValidationError> for ApplicationError {
    fn from(value: ValidationError) -> Self {
        Self::Domain(DomainError::Validation(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("method not allowed: {message}")]
    MethodNotAllowed { message: String, correlation_id: String },
    #[error("unsupported media type: {message}")]
    UnsupportedMediaType { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into(), correlation_id: UNASSIGNED.to_owned() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into(), correlation_id: UNASSIGNED.to_owned() }
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed { message: message.into(), correlation_id: UNASSIGNED.to_owned() }
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            message: message.into(),
            correlation_id: UNASSIGNED.to_owned(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::MethodNotAllowed { message, .. }
            | Self::UnsupportedMediaType { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::MethodNotAllowed { correlation_id, .. }
            | Self::UnsupportedMediaType { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    pub fn with_correlation_id(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::MethodNotAllowed { correlation_id, .. }
            | Self::UnsupportedMediaType { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => *correlation_id = value.into(),
        }
        self
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested resource does not exist.",
            Self::MethodNotAllowed { .. } => "The method is not allowed for this resource.",
            Self::UnsupportedMediaType { .. } => "The request body must be application/json.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

const UNASSIGNED: &str = "unassigned";

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError::from(self).with_correlation_id(correlation_id)
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::Validation(error)) => {
                Self::bad_request(error.to_string())
            }
            ApplicationError::Domain(error @ DomainError::InvalidStatus { .. }) => {
                Self::bad_request(error.to_string())
            }
            error @ ApplicationError::NotFound(_) => Self::not_found(error.to_string()),
            ApplicationError::ConstraintViolation(message) => Self::bad_request(message),
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: UNASSIGNED.to_owned() }
            }
            ApplicationError::Internal(message) => {
                Self::Internal { message, correlation_id: UNASSIGNED.to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::customer::CustomerId;
    use crate::errors::{ApplicationError, DomainError, InterfaceError, ValidationError};

    #[test]
    fn validation_error_maps_to_bad_request_naming_the_field() {
        let interface =
            ApplicationError::from(ValidationError::MissingField("email")).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, ref message }
                if correlation_id == "req-1" && message.contains("missing email")
        ));
    }

    #[test]
    fn invalid_status_maps_to_bad_request() {
        let interface = ApplicationError::from(DomainError::InvalidStatus {
            label: "BOGUS".to_owned(),
        })
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
        assert!(interface.message().contains("BOGUS"));
    }

    #[test]
    fn not_found_message_mentions_was_not_found() {
        let interface = ApplicationError::NotFound(CustomerId(42)).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.message(), "Customer with id '42' was not found.");
        assert_eq!(interface.correlation_id(), "req-3");
    }

    #[test]
    fn constraint_violation_maps_to_bad_request() {
        let interface =
            ApplicationError::ConstraintViolation("email already in use".to_owned())
                .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Persistence("database lock timeout".to_owned())
            .into_interface("req-5");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn internal_error_maps_to_internal() {
        let interface =
            ApplicationError::Internal("unknown customer status `GONE`".to_owned())
                .into_interface("req-6");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
