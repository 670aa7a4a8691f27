use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Complaint;
use crate::db::types::ComplaintStatus;

use super::types::{CreateComplaint, COLUMNS};

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateComplaint<'_>,
) -> Result<Complaint, sqlx::Error> {
    sqlx::query_as::<_, Complaint>(&format!(
        "INSERT INTO complaints (
            id, user_id, user_name, user_room, category, urgency, title, description,
            location, status, admin_notes, image_data, ai_analysis_text, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,'',$11,$12,$13,$13)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.user_name)
    .bind(params.user_room)
    .bind(params.category)
    .bind(params.urgency)
    .bind(params.title)
    .bind(params.description)
    .bind(params.location)
    .bind(params.status)
    .bind(params.image_data)
    .bind(params.ai_analysis_text)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

/// Moves a complaint to `status` only while its current status is one of
/// `allowed_from`. Returns `None` when the row is missing or was in another state.
/// Blank notes leave `admin_notes` untouched.
pub(crate) async fn update_status(
    pool: &PgPool,
    id: &str,
    status: ComplaintStatus,
    notes: Option<&str>,
    allowed_from: &[ComplaintStatus],
    now: PrimitiveDateTime,
) -> Result<Option<Complaint>, sqlx::Error> {
    let allowed: Vec<String> = allowed_from.iter().map(|item| item.as_str().to_string()).collect();
    let notes = notes.map(str::trim).filter(|value| !value.is_empty());

    sqlx::query_as::<_, Complaint>(&format!(
        "UPDATE complaints
         SET status = $1,
             admin_notes = COALESCE($2, admin_notes),
             updated_at = $3
         WHERE id = $4
           AND status::text = ANY($5)
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(notes)
    .bind(now)
    .bind(id)
    .bind(allowed)
    .fetch_optional(pool)
    .await
}
