use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::customer::{CreateCustomerRequest, Customer, UpdateCustomerRequest};
use crate::error::{AppError, Result};
use crate::server::AppState;

use super::MessageResponse;

pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = state.customers.create(request).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>> {
    Ok(Json(state.customers.list().await?))
}

/// Lookup by membership number (the path segment is not an id here)
pub async fn get_customer(
    State(state): State<AppState>,
    Path(membership_number): Path<String>,
) -> Result<Json<Customer>> {
    let customer = state.customers.get_by_membership(&membership_number).await?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>> {
    let id = parse_customer_id(&key)?;
    let customer = state.customers.update(id, request).await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_customer_id(&key)?;
    state.customers.delete(id).await?;
    Ok(Json(MessageResponse::new("Customer deleted")))
}

fn parse_customer_id(key: &str) -> Result<Uuid> {
    Uuid::parse_str(key)
        .map_err(|_| AppError::Validation(format!("invalid customer id '{key}'")))
}
