//! HTTP request handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::presentation::{
    CreatePresentationRequest, Presentation, PresentationListQuery, UpdatePresentationRequest,
};
use crate::slide::{Slide, SlideRequest, Tally};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Presentations
// ============================================================================

/// Create a presentation.
#[instrument(skip(state, payload))]
pub async fn create_presentation(
    State(state): State<AppState>,
    payload: Result<Json<CreatePresentationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Presentation>)> {
    let Json(request) = payload?;
    let presentation = state.presentations.create(request).await?;
    info!(presentation_id = presentation.id, "Created presentation");
    Ok((StatusCode::CREATED, Json(presentation)))
}

/// List presentations, optionally by owner.
#[instrument(skip(state, query))]
pub async fn list_presentations(
    State(state): State<AppState>,
    query: Result<Query<PresentationListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Presentation>>> {
    let Query(query) = query?;
    Ok(Json(state.presentations.list(query).await?))
}

#[instrument(skip(state))]
pub async fn get_presentation(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Presentation>> {
    let Path(id) = path?;
    state
        .presentations
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("presentation {id}")))
}

#[instrument(skip(state, payload))]
pub async fn update_presentation(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdatePresentationRequest>, JsonRejection>,
) -> ApiResult<Json<Presentation>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    Ok(Json(state.presentations.rename(id, request).await?))
}

#[instrument(skip(state))]
pub async fn delete_presentation(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    state.presentations.delete(id).await?;
    info!(presentation_id = id, "Deleted presentation");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Slides
// ============================================================================

#[instrument(skip(state))]
pub async fn list_slides(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Slide>>> {
    let Path(id) = path?;
    Ok(Json(state.slides.list_slides(id).await?))
}

#[instrument(skip(state))]
pub async fn get_slide(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Json<Slide>> {
    let Path((id, slide_id)) = path?;
    Ok(Json(state.slides.get_slide(id, slide_id).await?))
}

/// Create a slide with its typed content.
#[instrument(skip(state, payload))]
pub async fn create_slide(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SlideRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Slide>)> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let slide = state.slides.create_slide(id, request).await?;
    info!(presentation_id = id, slide_id = slide.id, kind = %slide.kind, "Created slide");
    Ok((StatusCode::CREATED, Json(slide)))
}

#[instrument(skip(state, payload))]
pub async fn update_slide(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<SlideRequest>, JsonRejection>,
) -> ApiResult<Json<Slide>> {
    let Path((id, slide_id)) = path?;
    let Json(request) = payload?;
    Ok(Json(state.slides.update_slide(id, slide_id, request).await?))
}

#[instrument(skip(state))]
pub async fn delete_slide(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path((id, slide_id)) = path?;
    state.slides.delete_slide(id, slide_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Votes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VoteQuery {
    pub option_id: i64,
}

/// Record a vote and return the updated tally of the poll.
#[instrument(skip(state, query))]
pub async fn submit_vote(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    query: Result<Query<VoteQuery>, QueryRejection>,
) -> ApiResult<Json<Tally>> {
    let Path((id, content_id)) = path?;
    let Query(VoteQuery { option_id }) = query?;
    Ok(Json(state.slides.submit_vote(id, content_id, option_id).await?))
}
