use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::queue::{AdvanceOutcome, QueueEntry};
use crate::server::AppState;

use super::MessageResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQueueRequest {
    pub membership_number: String,
    pub section: String,
}

pub async fn join_queue(
    State(state): State<AppState>,
    Json(request): Json<JoinQueueRequest>,
) -> Result<(StatusCode, Json<QueueEntry>)> {
    if request.membership_number.trim().is_empty() {
        return Err(AppError::Validation("membershipNumber is required".into()));
    }
    if request.section.trim().is_empty() {
        return Err(AppError::Validation("section is required".into()));
    }

    let entry = state
        .engine
        .enqueue(request.membership_number.trim(), request.section.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_queue(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<Vec<QueueEntry>>> {
    Ok(Json(state.engine.list_queue(&section).await?))
}

pub async fn remove_queue_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = Uuid::parse_str(&key)
        .map_err(|_| AppError::Validation(format!("invalid queue entry id '{key}'")))?;
    state.engine.remove_entry(id).await?;
    Ok(Json(MessageResponse::new("Queue updated")))
}

pub async fn finish_customer(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<AdvanceOutcome>> {
    let outcome = state.engine.advance_service(&section).await?;
    Ok(Json(outcome))
}
