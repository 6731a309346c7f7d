//! `/customers` resource handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use customers_core::domain::customer::{Customer, CustomerStatus};
use customers_core::errors::ApplicationError;
use tracing::info;

use crate::{
    app::AppState,
    error::ApiError,
    extract::{CustomerBody, CustomerPath, CustomerQuery},
};

pub async fn list(
    State(state): State<AppState>,
    query: CustomerQuery,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = match (query.email, query.first_name) {
        (Some(email), _) => state.customers.find_by_email(&email).await?,
        (None, Some(first_name)) => state.customers.find_by_first_name(&first_name).await?,
        (None, None) => state.customers.list_all().await?,
    };

    Ok(Json(customers))
}

pub async fn show(
    State(state): State<AppState>,
    CustomerPath(id): CustomerPath,
) -> Result<Json<Customer>, ApiError> {
    let customer =
        state.customers.find_by_id(id).await?.ok_or(ApplicationError::NotFound(id))?;

    Ok(Json(customer))
}

pub async fn create(
    State(state): State<AppState>,
    CustomerBody(draft): CustomerBody,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state.customers.create(draft).await?;
    info!(
        event_name = "http.customer.created",
        customer_id = %customer.id,
        status = customer.status.as_str(),
        "customer created"
    );

    let location = format!("/customers/{}", customer.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(customer)))
}

pub async fn replace(
    State(state): State<AppState>,
    CustomerPath(id): CustomerPath,
    CustomerBody(draft): CustomerBody,
) -> Result<Json<Customer>, ApiError> {
    let existing =
        state.customers.find_by_id(id).await?.ok_or(ApplicationError::NotFound(id))?;

    let customer = state.customers.update(existing.replaced_with(draft)).await?;
    info!(event_name = "http.customer.replaced", customer_id = %customer.id, "customer replaced");

    Ok(Json(customer))
}

/// Deleting an unknown (or unparsable) id still answers 204.
pub async fn remove(
    State(state): State<AppState>,
    path: Result<CustomerPath, ApiError>,
) -> Result<StatusCode, ApiError> {
    if let Ok(CustomerPath(id)) = path {
        let removed = state.customers.delete(id).await?;
        info!(
            event_name = "http.customer.deleted",
            customer_id = %id,
            removed,
            "customer delete handled"
        );
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn suspend(
    state: State<AppState>,
    path: CustomerPath,
) -> Result<Json<Customer>, ApiError> {
    transition(state, path, CustomerStatus::Suspended).await
}

pub async fn activate(
    state: State<AppState>,
    path: CustomerPath,
) -> Result<Json<Customer>, ApiError> {
    transition(state, path, CustomerStatus::Active).await
}

async fn transition(
    State(state): State<AppState>,
    CustomerPath(id): CustomerPath,
    status: CustomerStatus,
) -> Result<Json<Customer>, ApiError> {
    let customer = state.customers.set_status(id, status).await?;
    info!(
        event_name = "http.customer.status_changed",
        customer_id = %customer.id,
        status = customer.status.as_str(),
        "customer status changed"
    );

    Ok(Json(customer))
}
