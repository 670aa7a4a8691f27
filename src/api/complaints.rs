use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Complaint;
use crate::db::types::ComplaintStatus;
use crate::repositories;
use crate::repositories::complaints::ComplaintFilter;
use crate::schemas::complaint::{ComplaintCreate, ComplaintListQuery, ComplaintResponse};
use crate::services::complaint_intake::{submit_direct, DirectSubmission};
use crate::services::status_transitions::{check_transition, Actor};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_complaint))
        .route("/mine", get(list_mine))
        .route("/:complaint_id", get(get_complaint))
        .route("/:complaint_id/cancel", post(cancel_complaint))
}

async fn create_complaint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ComplaintCreate>,
) -> Result<(StatusCode, Json<ComplaintResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let complaint = submit_direct(
        &state,
        &user,
        DirectSubmission {
            description: payload.description,
            category: payload.category,
            room: payload.room,
            image_base64: payload.image_base64,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ComplaintResponse::from_db(complaint))))
}

async fn list_mine(
    Query(params): Query<ComplaintListQuery>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PaginatedResponse<ComplaintResponse>>, ApiError> {
    let filter = params.into_filter(Some(user.id));
    list_page(&state, filter).await.map(Json)
}

async fn get_complaint(
    Path(complaint_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ComplaintResponse>, ApiError> {
    let complaint = fetch_complaint(&state, &complaint_id).await?;
    if complaint.user_id != user.id && !user.is_admin {
        return Err(ApiError::Forbidden("Access denied"));
    }
    Ok(Json(ComplaintResponse::from_db(complaint)))
}

async fn cancel_complaint(
    Path(complaint_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ComplaintResponse>, ApiError> {
    let complaint = fetch_complaint(&state, &complaint_id).await?;
    if complaint.user_id != user.id {
        return Err(ApiError::Forbidden("Access denied"));
    }

    let updated =
        transition(&state, &complaint, Actor::Owner, ComplaintStatus::Cancelled, None).await?;
    tracing::info!(complaint_id = %updated.id, user_id = %user.id, "Complaint cancelled");
    Ok(Json(ComplaintResponse::from_db(updated)))
}

pub(crate) async fn fetch_complaint(state: &AppState, id: &str) -> Result<Complaint, ApiError> {
    repositories::complaints::find_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load complaint"))?
        .ok_or_else(|| ApiError::NotFound("Complaint not found".to_string()))
}

/// Validates the move against the current row, then applies it conditionally so
/// a concurrent change surfaces as a conflict instead of being overwritten.
pub(crate) async fn transition(
    state: &AppState,
    complaint: &Complaint,
    actor: Actor,
    target: ComplaintStatus,
    notes: Option<&str>,
) -> Result<Complaint, ApiError> {
    let sources = check_transition(actor, complaint.status, target)?;

    repositories::complaints::update_status(
        state.db(),
        &complaint.id,
        target,
        notes,
        sources,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update complaint status"))?
    .ok_or_else(|| ApiError::Conflict("Complaint status changed, reload and retry".to_string()))
}

pub(crate) async fn list_page(
    state: &AppState,
    filter: ComplaintFilter,
) -> Result<PaginatedResponse<ComplaintResponse>, ApiError> {
    let items = repositories::complaints::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list complaints"))?;
    let total_count = repositories::complaints::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count complaints"))?;

    Ok(PaginatedResponse::new(
        items.into_iter().map(ComplaintResponse::from_db).collect(),
        total_count,
        filter.skip,
        filter.limit,
    ))
}
