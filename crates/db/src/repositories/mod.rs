use async_trait::async_trait;
use thiserror::Error;

use customers_core::domain::customer::{Customer, CustomerId, CustomerStatus, NewCustomer};
use customers_core::errors::{ApplicationError, ValidationError};

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{0}")]
    ConstraintViolation(String),
    #[error(transparent)]
    InvalidRecord(#[from] ValidationError),
    #[error("customer `{0}` was not found")]
    NotFound(CustomerId),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::InvalidRecord(error) => Self::from(error),
            RepositoryError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::Decode(message) => Self::Internal(message),
            RepositoryError::Database(error) => Self::Persistence(error.to_string()),
        }
    }
}

/// Persistence boundary for customer records.
///
/// Every method is a single atomic storage operation; a failed write leaves the stored
/// state untouched.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Assigns a fresh id and stores the record, defaulting `status` to ACTIVE.
    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, RepositoryError>;

    async fn find_by_first_name(&self, first_name: &str)
        -> Result<Vec<Customer>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError>;

    /// Replaces every mutable field of the record identified by `customer.id`.
    async fn update(&self, customer: Customer) -> Result<Customer, RepositoryError>;

    /// Returns whether a record was removed. Deleting an unknown id is not an error.
    async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError>;

    async fn set_status(
        &self,
        id: CustomerId,
        status: CustomerStatus,
    ) -> Result<Customer, RepositoryError>;

    async fn suspend(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        self.set_status(id, CustomerStatus::Suspended).await
    }

    async fn activate(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        self.set_status(id, CustomerStatus::Active).await
    }
}
