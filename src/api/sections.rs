use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::section::{Section, SectionRequest};
use crate::server::AppState;

use super::MessageResponse;

pub async fn create_section(
    State(state): State<AppState>,
    Json(request): Json<SectionRequest>,
) -> Result<(StatusCode, Json<Section>)> {
    let section = state.sections.create(&request.name).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn list_sections(State(state): State<AppState>) -> Result<Json<Vec<Section>>> {
    Ok(Json(state.sections.list().await?))
}

pub async fn rename_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SectionRequest>,
) -> Result<Json<Section>> {
    let section = state.sections.rename(id, &request.name).await?;
    Ok(Json(section))
}

pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    state.sections.delete(id).await?;
    Ok(Json(MessageResponse::new(
        "Section and associated queue entries deleted",
    )))
}
