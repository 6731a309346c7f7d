use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts, HeaderMap},
};
use customers_core::domain::customer::{CustomerId, CustomerPayload, NewCustomer};

use crate::error::ApiError;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A customer document taken from a JSON request body.
///
/// The content type is checked before the body is read, so a wrong media type is reported
/// as 415 even when the body would also fail to decode.
#[derive(Debug)]
pub struct CustomerBody(pub NewCustomer);

impl<S> FromRequest<S> for CustomerBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        require_content_type(request.headers(), JSON_CONTENT_TYPE)?;

        let body = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        Ok(Self(CustomerPayload::decode_slice(&body)?))
    }
}

/// The `{id}` segment of a customer route.
///
/// Anything that does not decode to an integer id, including malformed percent-encoding,
/// is reported as a missing customer.
#[derive(Debug)]
pub struct CustomerPath(pub CustomerId);

impl<S> FromRequestParts<S> for CustomerPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(raw)) => raw,
            Err(_) => raw_id_segment(parts.uri.path()).to_string(),
        };

        raw.trim().parse::<i64>().map(|id| Self(CustomerId(id))).map_err(|_| {
            ApiError::not_found(format!("Customer with id '{raw}' was not found."))
        })
    }
}

fn raw_id_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').nth(1).unwrap_or_default()
}

/// Search filters for `GET /customers`. Repeated keys keep their first value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    pub email: Option<String>,
    pub first_name: Option<String>,
}

impl<S> FromRequestParts<S> for CustomerQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        let first = |name: &str| {
            pairs
                .iter()
                .find(|(key, value)| key == name && !value.is_empty())
                .map(|(_, value)| value.clone())
        };

        Ok(Self { email: first("email"), first_name: first("first_name") })
    }
}

pub fn require_content_type(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Err(ApiError::unsupported_media_type(format!("Content-Type must be {expected}")));
    };

    let essence = value
        .to_str()
        .ok()
        .and_then(|raw| raw.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase());

    match essence {
        Some(essence) if essence == expected => Ok(()),
        _ => Err(ApiError::unsupported_media_type(format!(
            "Content-Type must be {expected}, got `{}`",
            String::from_utf8_lossy(value.as_bytes())
        ))),
    }
}
