use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::complaint::ComplaintResponse;
use crate::schemas::draft::{CategorySelection, DraftCreate, DraftResponse, DraftUpdateRequest};
use crate::services::complaint_intake::{
    schedule_text_classification, spawn_photo_classification, submit_draft,
};
use crate::services::drafts::{Draft, DraftUpdate, PhotoChange};
use crate::services::photos;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_draft))
        .route("/:draft_id", get(get_draft).patch(update_draft).delete(discard_draft))
        .route("/:draft_id/category", put(select_category))
        .route("/:draft_id/photo", post(upload_photo).delete(remove_photo))
        .route("/:draft_id/submit", post(submit))
}

async fn create_draft(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<DraftCreate>,
) -> Result<(StatusCode, Json<DraftResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let draft =
        state.drafts().create(&user.id, payload.text, payload.room, payload.category).await?;
    schedule_text_classification(&state, &draft);
    tracing::debug!(draft_id = %draft.id, user_id = %user.id, "Draft opened");

    Ok((StatusCode::CREATED, Json(respond(&state, &draft))))
}

async fn get_draft(
    Path(draft_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DraftResponse>, ApiError> {
    let draft = state.drafts().get(parse_draft_id(&draft_id)?, &user.id).await?;
    Ok(Json(respond(&state, &draft)))
}

async fn update_draft(
    Path(draft_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<DraftUpdateRequest>,
) -> Result<Json<DraftResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let update = DraftUpdate { text: payload.text, room: payload.room };
    let (draft, text_changed) =
        state.drafts().update(parse_draft_id(&draft_id)?, &user.id, update).await?;
    if text_changed {
        schedule_text_classification(&state, &draft);
    }

    Ok(Json(respond(&state, &draft)))
}

async fn discard_draft(
    Path(draft_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    let draft_id = parse_draft_id(&draft_id)?;
    state.drafts().discard(draft_id, &user.id).await?;
    state.debouncer().cancel(&draft_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn select_category(
    Path(draft_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CategorySelection>,
) -> Result<Json<DraftResponse>, ApiError> {
    let draft = state
        .drafts()
        .select_category(parse_draft_id(&draft_id)?, &user.id, payload.category)
        .await?;
    Ok(Json(respond(&state, &draft)))
}

async fn upload_photo(
    Path(draft_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<DraftResponse>, ApiError> {
    let draft_id = parse_draft_id(&draft_id)?;
    state.drafts().get(draft_id, &user.id).await?;

    let storage = state.settings().storage();
    let max_bytes = storage.max_upload_bytes();
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("photo.jpg").to_string();
        let content_type =
            field.content_type().unwrap_or("application/octet-stream").to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "Photo exceeds {}MB limit",
                    storage.max_upload_size_mb
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((filename, content_type, bytes));
    }

    let (filename, content_type, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let photo = photos::prepare_upload(state.settings(), &filename, &content_type, &bytes)?;

    let (draft, change) = state.drafts().attach_photo(draft_id, &user.id, photo).await?;
    if let PhotoChange::Classify { revision } = change {
        spawn_photo_classification(&state, &draft, revision);
    }
    tracing::debug!(draft_id = %draft_id, change = ?change, "Photo attached");

    Ok(Json(respond(&state, &draft)))
}

async fn remove_photo(
    Path(draft_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DraftResponse>, ApiError> {
    let draft = state.drafts().remove_photo(parse_draft_id(&draft_id)?, &user.id).await?;
    Ok(Json(respond(&state, &draft)))
}

async fn submit(
    Path(draft_id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<ComplaintResponse>), ApiError> {
    let complaint = submit_draft(&state, &user, parse_draft_id(&draft_id)?).await?;
    Ok((StatusCode::CREATED, Json(ComplaintResponse::from_db(complaint))))
}

fn parse_draft_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Draft not found".to_string()))
}

fn respond(state: &AppState, draft: &Draft) -> DraftResponse {
    DraftResponse::from_draft(
        draft,
        state.debouncer().is_pending(&draft.id),
        state.classifier().is_enabled(),
    )
}
