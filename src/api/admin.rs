use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use validator::Validate;

use crate::api::complaints::{fetch_complaint, list_page, transition};
use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::complaint::{
    ComplaintListQuery, ComplaintResponse, StatsResponse, StatusUpdateRequest,
};
use crate::services::status_transitions::Actor;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/complaints", get(list_complaints))
        .route("/complaints/:complaint_id/status", patch(update_status))
        .route("/stats", get(stats))
}

async fn list_complaints(
    Query(params): Query<ComplaintListQuery>,
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<PaginatedResponse<ComplaintResponse>>, ApiError> {
    list_page(&state, params.into_filter(None)).await.map(Json)
}

async fn update_status(
    Path(complaint_id): Path<String>,
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<ComplaintResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let complaint = fetch_complaint(&state, &complaint_id).await?;
    let updated = transition(
        &state,
        &complaint,
        Actor::Admin,
        payload.status,
        payload.admin_notes.as_deref(),
    )
    .await?;

    tracing::info!(
        complaint_id = %updated.id,
        admin_id = %admin.id,
        from = complaint.status.as_str(),
        to = updated.status.as_str(),
        "Complaint status updated"
    );
    Ok(Json(ComplaintResponse::from_db(updated)))
}

async fn stats(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = repositories::complaints::stats(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load complaint stats"))?;
    Ok(Json(StatsResponse::from_stats(stats)))
}
