use std::collections::BTreeMap;

use tokio::sync::RwLock;

use customers_core::domain::customer::{Customer, CustomerId, CustomerStatus, NewCustomer};

use super::{CustomerRepository, RepositoryError};

/// Non-durable repository mirroring the SQL constraints (unique email, monotonic ids).
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    customers: BTreeMap<i64, Customer>,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<CustomerId>) -> bool {
        self.customers
            .values()
            .any(|customer| customer.email == email && Some(customer.id) != except)
    }

    fn matching(&self, predicate: impl Fn(&Customer) -> bool) -> Vec<Customer> {
        self.customers.values().filter(|customer| predicate(customer)).cloned().collect()
    }
}

fn duplicate_email(email: &str) -> RepositoryError {
    RepositoryError::ConstraintViolation(format!(
        "a customer with that email already exists ({email})"
    ))
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        customer.validate()?;
        let mut state = self.state.write().await;
        if state.email_taken(&customer.email, None) {
            return Err(duplicate_email(&customer.email));
        }

        state.last_id += 1;
        let status = customer.status_or_default();
        let stored = Customer {
            id: CustomerId(state.last_id),
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            password: customer.password,
            status,
        };
        state.customers.insert(stored.id.0, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.customers.get(&id.0).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.matching(|customer| customer.email == email))
    }

    async fn find_by_first_name(
        &self,
        first_name: &str,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.matching(|customer| customer.first_name == first_name))
    }

    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.customers.values().cloned().collect())
    }

    async fn update(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        customer.validate()?;
        let mut state = self.state.write().await;
        if !state.customers.contains_key(&customer.id.0) {
            return Err(RepositoryError::NotFound(customer.id));
        }
        if state.email_taken(&customer.email, Some(customer.id)) {
            return Err(duplicate_email(&customer.email));
        }

        state.customers.insert(customer.id.0, customer.clone());
        Ok(customer)
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.customers.remove(&id.0).is_some())
    }

    async fn set_status(
        &self,
        id: CustomerId,
        status: CustomerStatus,
    ) -> Result<Customer, RepositoryError> {
        let mut state = self.state.write().await;
        let customer = state.customers.get_mut(&id.0).ok_or(RepositoryError::NotFound(id))?;
        customer.status = status;
        Ok(customer.clone())
    }
}
