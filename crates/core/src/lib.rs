pub mod config;
pub mod domain;
pub mod errors;

pub use domain::customer::{Customer, CustomerId, CustomerPayload, CustomerStatus, NewCustomer};
pub use errors::{ApplicationError, DomainError, InterfaceError, ValidationError};
