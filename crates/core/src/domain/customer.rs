use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{DomainError, ValidationError};

pub const FIRST_NAME_MAX_LEN: usize = 64;
pub const LAST_NAME_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 128;
pub const PASSWORD_MAX_LEN: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    #[default]
    Active,
    Suspended,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
        }
    }

    /// Case-insensitive parse. An empty label carries no status and yields `Ok(None)`.
    pub fn from_label(label: &str) -> Result<Option<Self>, DomainError> {
        match label.trim().to_ascii_uppercase().as_str() {
            "" => Ok(None),
            "ACTIVE" => Ok(Some(Self::Active)),
            "SUSPENDED" => Ok(Some(Self::Suspended)),
            _ => Err(DomainError::InvalidStatus { label: label.to_string() }),
        }
    }

    /// Never fails: empty or unknown labels compare unequal.
    pub fn matches_label(label: &str, status: Self) -> bool {
        matches!(Self::from_label(label), Ok(Some(parsed)) if parsed == status)
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value)?
            .ok_or_else(|| DomainError::InvalidStatus { label: value.to_string() })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub status: CustomerStatus,
}

impl Customer {
    /// Builds the full-replace form of an existing record. The id always comes from the
    /// caller, and an omitted status keeps the current one.
    pub fn replaced_with(&self, draft: NewCustomer) -> Self {
        Self {
            id: self.id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            password: draft.password,
            status: draft.status.unwrap_or(self.status),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.first_name, &self.last_name, &self.email, &self.password)
    }
}

/// A customer record that has not been assigned an id yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,
}

impl NewCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.first_name, &self.last_name, &self.email, &self.password)
    }

    pub fn status_or_default(&self) -> CustomerStatus {
        self.status.unwrap_or_default()
    }
}

impl From<Customer> for NewCustomer {
    fn from(customer: Customer) -> Self {
        Self {
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            password: customer.password,
            status: Some(customer.status),
        }
    }
}

/// Decodes untrusted JSON into a [`NewCustomer`], naming the first offending field.
pub struct CustomerPayload;

impl CustomerPayload {
    pub fn decode(value: &Value) -> Result<NewCustomer, ValidationError> {
        let object = value.as_object().ok_or_else(|| {
            ValidationError::MalformedBody("body of request contained bad or no data".to_string())
        })?;

        let draft = NewCustomer {
            first_name: required_string(object, "first_name")?,
            last_name: required_string(object, "last_name")?,
            email: required_string(object, "email")?,
            password: required_string(object, "password")?,
            status: optional_status(object)?,
        };
        draft.validate()?;

        Ok(draft)
    }

    pub fn decode_slice(body: &[u8]) -> Result<NewCustomer, ValidationError> {
        let value = serde_json::from_slice::<Value>(body)
            .map_err(|error| ValidationError::MalformedBody(error.to_string()))?;
        Self::decode(&value)
    }
}

fn required_string(object: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => {
            Err(ValidationError::InvalidField { field, reason: "must be a string".to_string() })
        }
    }
}

fn optional_status(object: &Map<String, Value>) -> Result<Option<CustomerStatus>, ValidationError> {
    match object.get("status") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(label)) => CustomerStatus::from_label(label).map_err(|error| {
            ValidationError::InvalidField { field: "status", reason: error.to_string() }
        }),
        Some(_) => Err(ValidationError::InvalidField {
            field: "status",
            reason: "must be a string".to_string(),
        }),
    }
}

fn validate_fields(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationError> {
    check_bounds("first_name", first_name, FIRST_NAME_MAX_LEN)?;
    check_bounds("last_name", last_name, LAST_NAME_MAX_LEN)?;
    check_bounds("email", email, EMAIL_MAX_LEN)?;
    check_bounds("password", password, PASSWORD_MAX_LEN)?;
    Ok(())
}

fn check_bounds(field: &'static str, value: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidField { field, reason: "must not be empty".to_string() });
    }
    if value.chars().count() > max_len {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("must be at most {max_len} characters"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Customer, CustomerId, CustomerPayload, CustomerStatus, NewCustomer};
    use crate::errors::{DomainError, ValidationError};

    fn customer_fixture() -> Customer {
        Customer {
            id: CustomerId(7),
            first_name: "Jo".to_string(),
            last_name: "Lee".to_string(),
            email: "jo@x.com".to_string(),
            password: "p1".to_string(),
            status: CustomerStatus::Suspended,
        }
    }

    #[test]
    fn status_labels_parse_case_insensitively() {
        assert_eq!(CustomerStatus::from_label("ACTIVE"), Ok(Some(CustomerStatus::Active)));
        assert_eq!(CustomerStatus::from_label("suspended"), Ok(Some(CustomerStatus::Suspended)));
        assert_eq!(CustomerStatus::from_label(" Active "), Ok(Some(CustomerStatus::Active)));
    }

    #[test]
    fn empty_status_label_yields_no_value() {
        assert_eq!(CustomerStatus::from_label(""), Ok(None));
    }

    #[test]
    fn unknown_status_label_is_rejected() {
        assert_eq!(
            CustomerStatus::from_label("BOGUS"),
            Err(DomainError::InvalidStatus { label: "BOGUS".to_string() })
        );
        assert!("".parse::<CustomerStatus>().is_err());
    }

    #[test]
    fn status_label_comparison_never_fails() {
        assert!(CustomerStatus::matches_label("ACTIVE", CustomerStatus::Active));
        assert!(CustomerStatus::matches_label("SUSPENDED", CustomerStatus::Suspended));
        assert!(CustomerStatus::matches_label("active", CustomerStatus::Active));
        assert!(!CustomerStatus::matches_label("", CustomerStatus::Active));
        assert!(!CustomerStatus::matches_label("BOGUS", CustomerStatus::Suspended));
        assert!(!CustomerStatus::matches_label("ACTIVE", CustomerStatus::Suspended));
    }

    #[test]
    fn status_renders_canonical_literal() {
        assert_eq!(CustomerStatus::Active.to_string(), "ACTIVE");
        assert_eq!(CustomerStatus::Suspended.as_str(), "SUSPENDED");
        assert_eq!(CustomerStatus::default(), CustomerStatus::Active);
    }

    #[test]
    fn customer_serializes_with_flat_id_and_status_literal() {
        let value = serde_json::to_value(customer_fixture()).expect("serialize customer");

        assert_eq!(
            value,
            json!({
                "id": 7,
                "first_name": "Jo",
                "last_name": "Lee",
                "email": "jo@x.com",
                "password": "p1",
                "status": "SUSPENDED",
            })
        );
    }

    #[test]
    fn serialized_customer_decodes_back_to_the_same_fields() {
        let customer = customer_fixture();
        let value = serde_json::to_value(&customer).expect("serialize customer");

        let draft = CustomerPayload::decode(&value).expect("decode payload");

        assert_eq!(draft, NewCustomer::from(customer));
    }

    #[test]
    fn decode_without_status_leaves_it_for_defaulting() {
        let draft = CustomerPayload::decode(&json!({
            "first_name": "Jo",
            "last_name": "Lee",
            "email": "jo@x.com",
            "password": "p1",
        }))
        .expect("decode payload");

        assert_eq!(draft.status, None);
        assert_eq!(draft.status_or_default(), CustomerStatus::Active);
    }

    #[test]
    fn decode_names_the_missing_field() {
        let error = CustomerPayload::decode(&json!({
            "first_name": "Jo",
            "email": "jo@x.com",
            "password": "p1",
        }))
        .expect_err("last_name is required");

        assert_eq!(error, ValidationError::MissingField("last_name"));
        assert_eq!(error.to_string(), "Invalid Customer: missing last_name");
    }

    #[test]
    fn decode_treats_null_as_missing() {
        let error = CustomerPayload::decode(&json!({
            "first_name": null,
            "last_name": "Lee",
            "email": "jo@x.com",
            "password": "p1",
        }))
        .expect_err("null first_name");

        assert_eq!(error, ValidationError::MissingField("first_name"));
    }

    #[test]
    fn decode_rejects_non_object_bodies() {
        assert!(matches!(
            CustomerPayload::decode(&json!(["Jo", "Lee"])),
            Err(ValidationError::MalformedBody(_))
        ));
        assert!(matches!(
            CustomerPayload::decode_slice(b"{not json"),
            Err(ValidationError::MalformedBody(_))
        ));
    }

    #[test]
    fn decode_rejects_bad_field_values() {
        let wrong_type = CustomerPayload::decode(&json!({
            "first_name": 12,
            "last_name": "Lee",
            "email": "jo@x.com",
            "password": "p1",
        }));
        assert!(matches!(
            wrong_type,
            Err(ValidationError::InvalidField { field: "first_name", .. })
        ));

        let too_long = CustomerPayload::decode(&json!({
            "first_name": "Jo",
            "last_name": "Lee",
            "email": format!("{}@x.com", "a".repeat(200)),
            "password": "p1",
        }));
        assert!(matches!(too_long, Err(ValidationError::InvalidField { field: "email", .. })));

        let bad_status = CustomerPayload::decode(&json!({
            "first_name": "Jo",
            "last_name": "Lee",
            "email": "jo@x.com",
            "password": "p1",
            "status": "BOGUS",
        }));
        assert!(matches!(bad_status, Err(ValidationError::InvalidField { field: "status", .. })));
    }

    #[test]
    fn replaced_with_keeps_id_and_falls_back_to_current_status() {
        let existing = customer_fixture();
        let replaced = existing.replaced_with(NewCustomer {
            first_name: "Abraham".to_string(),
            last_name: "Abrahamson".to_string(),
            email: "honestabe@roadrunner.com".to_string(),
            password: "password123".to_string(),
            status: None,
        });

        assert_eq!(replaced.id, existing.id);
        assert_eq!(replaced.status, CustomerStatus::Suspended);
        assert_eq!(replaced.first_name, "Abraham");
    }
}
