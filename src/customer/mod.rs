//! Customer directory: reference data, independent of queue state.
//!
//! Queue entries reference customers only by membership number; a customer
//! may exist without any queue entry and vice versa.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::store::RecordStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub membership_number: String,
    pub name: String,
    pub designation: String,
    pub hospital: String,
}

impl Customer {
    pub fn new(
        membership_number: impl Into<String>,
        name: impl Into<String>,
        designation: impl Into<String>,
        hospital: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            membership_number: membership_number.into(),
            name: name.into(),
            designation: designation.into(),
            hospital: hospital.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub membership_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub hospital: String,
}

/// Partial update; only fields that are present and non-empty overwrite.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub membership_number: Option<String>,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub hospital: Option<String>,
}

pub struct CustomerDirectory {
    store: Arc<dyn RecordStore>,
}

impl CustomerDirectory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateCustomerRequest) -> Result<Customer> {
        if request.membership_number.trim().is_empty() {
            return Err(AppError::Validation("membershipNumber is required".into()));
        }

        let customer = Customer::new(
            request.membership_number.trim(),
            request.name,
            request.designation,
            request.hospital,
        );
        self.store.insert_customer(&customer).await?;

        tracing::info!(
            customer_id = %customer.id,
            membership_number = %customer.membership_number,
            "Customer created"
        );
        Ok(customer)
    }

    pub async fn list(&self) -> Result<Vec<Customer>> {
        Ok(self.store.list_customers().await?)
    }

    pub async fn get_by_membership(&self, membership_number: &str) -> Result<Customer> {
        self.store
            .find_customer_by_membership(membership_number)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "customer with membership number '{membership_number}' not found"
                ))
            })
    }

    pub async fn update(&self, id: Uuid, request: UpdateCustomerRequest) -> Result<Customer> {
        let mut customer = self
            .store
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;

        apply_field(&mut customer.membership_number, request.membership_number);
        apply_field(&mut customer.name, request.name);
        apply_field(&mut customer.designation, request.designation);
        apply_field(&mut customer.hospital, request.hospital);

        self.store.update_customer(&customer).await?;
        tracing::info!(customer_id = %id, "Customer updated");
        Ok(customer)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_customer(id).await? {
            return Err(AppError::NotFound(format!("customer {id} not found")));
        }
        tracing::info!(customer_id = %id, "Customer deleted");
        Ok(())
    }
}

fn apply_field(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        if !value.is_empty() {
            *target = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn create_directory() -> CustomerDirectory {
        CustomerDirectory::new(Arc::new(MemoryStore::new()))
    }

    fn create_request(membership_number: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            membership_number: membership_number.to_string(),
            name: "Asha".to_string(),
            designation: "Nurse".to_string(),
            hospital: "General".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_membership() {
        let directory = create_directory();
        let customer = directory.create(create_request("M-100")).await.unwrap();

        let found = directory.get_by_membership("M-100").await.unwrap();
        assert_eq!(found, customer);

        assert!(matches!(
            directory.get_by_membership("M-999").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_create_requires_membership_number() {
        let directory = create_directory();
        let err = directory.create(create_request("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_overwrites_only_present_non_empty_fields() {
        let directory = create_directory();
        let customer = directory.create(create_request("M-100")).await.unwrap();

        let updated = directory
            .update(
                customer.id,
                UpdateCustomerRequest {
                    membership_number: None,
                    name: Some("Asha K".to_string()),
                    designation: Some(String::new()),
                    hospital: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.membership_number, "M-100");
        assert_eq!(updated.name, "Asha K");
        // Empty string does not clear the existing value
        assert_eq!(updated.designation, "Nurse");
        assert_eq!(updated.hospital, "General");
    }

    #[tokio::test]
    async fn test_update_unknown_customer_is_not_found() {
        let directory = create_directory();
        let err = directory
            .update(Uuid::new_v4(), UpdateCustomerRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let directory = create_directory();
        let customer = directory.create(create_request("M-100")).await.unwrap();

        directory.delete(customer.id).await.unwrap();
        assert!(directory.list().await.unwrap().is_empty());
        assert!(matches!(
            directory.delete(customer.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
