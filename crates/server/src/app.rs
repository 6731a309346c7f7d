use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    routing::{get, put},
    Router,
};
use customers_db::{CustomerRepository, DbPool, SqlCustomerRepository};
use tower_http::trace::TraceLayer;

use crate::{customers, error::ApiError, health};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<dyn CustomerRepository>,
    pub db_pool: DbPool,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> Self {
        Self { customers: Arc::new(SqlCustomerRepository::new(db_pool.clone())), db_pool }
    }

    pub fn with_repository(db_pool: DbPool, customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers, db_pool }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::index).fallback(method_not_allowed))
        .route("/healthcheck", get(health::healthcheck).fallback(method_not_allowed))
        .route(
            "/customers",
            get(customers::list).post(customers::create).fallback(method_not_allowed),
        )
        .route(
            "/customers/{id}",
            get(customers::show)
                .put(customers::replace)
                .delete(customers::remove)
                .fallback(method_not_allowed),
        )
        .route(
            "/customers/{id}/suspend",
            put(customers::suspend).fallback(method_not_allowed),
        )
        .route(
            "/customers/{id}/activate",
            put(customers::activate).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::method_not_allowed(format!("Method {method} is not allowed on {}", uri.path()))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No resource found at {}", uri.path()))
}
