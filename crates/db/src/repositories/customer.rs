use sqlx::{sqlite::SqliteRow, Row};
use tracing::info;

use customers_core::domain::customer::{Customer, CustomerId, CustomerStatus, NewCustomer};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, password, status";

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {predicate} = ? ORDER BY id ASC"
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(customer_from_row).collect()
    }
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        customer.validate()?;
        info!(event_name = "customer.create", email = %customer.email, "creating customer");

        let row = sqlx::query(&format!(
            "INSERT INTO customers (first_name, last_name, email, password, status)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.password)
        .bind(customer.status_or_default().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(classify_write_error)?;

        customer_from_row(row)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(customer_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, RepositoryError> {
        self.fetch_where("email", email).await
    }

    async fn find_by_first_name(
        &self,
        first_name: &str,
    ) -> Result<Vec<Customer>, RepositoryError> {
        self.fetch_where("first_name", first_name).await
    }

    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows =
            sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(customer_from_row).collect()
    }

    async fn update(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        customer.validate()?;
        info!(event_name = "customer.update", customer_id = %customer.id, "saving customer");

        let row = sqlx::query(&format!(
            "UPDATE customers
             SET first_name = ?, last_name = ?, email = ?, password = ?, status = ?
             WHERE id = ?
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.password)
        .bind(customer.status.as_str())
        .bind(customer.id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify_write_error)?;

        row.map(customer_from_row).transpose()?.ok_or(RepositoryError::NotFound(customer.id))
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM customers WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        let removed = result.rows_affected() > 0;
        info!(event_name = "customer.delete", customer_id = %id, removed, "deleted customer");
        Ok(removed)
    }

    async fn set_status(
        &self,
        id: CustomerId,
        status: CustomerStatus,
    ) -> Result<Customer, RepositoryError> {
        info!(
            event_name = "customer.status_changed",
            customer_id = %id,
            status = status.as_str(),
            "changing customer status"
        );

        let row = sqlx::query(&format!(
            "UPDATE customers SET status = ? WHERE id = ? RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(customer_from_row).transpose()?.ok_or(RepositoryError::NotFound(id))
    }
}

fn customer_from_row(row: SqliteRow) -> Result<Customer, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = CustomerStatus::from_label(&status_raw)
        .ok()
        .flatten()
        .ok_or_else(|| RepositoryError::Decode(format!("unknown customer status `{status_raw}`")))?;

    Ok(Customer {
        id: CustomerId(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        status,
    })
}

fn classify_write_error(error: sqlx::Error) -> RepositoryError {
    match &error {
        sqlx::Error::Database(database_error) if database_error.is_unique_violation() => {
            RepositoryError::ConstraintViolation(format!(
                "a customer with that email already exists ({})",
                database_error.message()
            ))
        }
        sqlx::Error::Database(database_error)
            if database_error.is_check_violation() || database_error.is_foreign_key_violation() =>
        {
            RepositoryError::ConstraintViolation(database_error.message().to_string())
        }
        _ => RepositoryError::Database(error),
    }
}
