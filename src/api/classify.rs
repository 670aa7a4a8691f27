use axum::{extract::State, routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::redis::RateScope;
use crate::core::state::AppState;
use crate::schemas::draft::{ClassifyRequest, ClassifyResponse};
use crate::services::classification::ClassificationError;
use crate::services::complaint_intake::failure_message;
use crate::services::urgency::reconcile_urgency;

const RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", post(classify))
}

/// Stateless preview: one attempt, no draft involved.
async fn classify(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if !state.classifier().is_enabled() {
        return Err(ApiError::ServiceUnavailable("AI analysis is not available".to_string()));
    }

    let limit = state.settings().classification().rate_limit_per_minute;
    let scope = RateScope::Classify { user_id: &user.id };
    if !state.redis().allow(&scope, limit, RATE_WINDOW_SECONDS).await {
        return Err(ApiError::TooManyRequests("Too many classification requests, try again later"));
    }

    let text = payload.text.trim();
    let classification = state.classifier().classify_text(text).await.map_err(|err| {
        tracing::warn!(user_id = %user.id, error = %err, "Classification preview failed");
        match err {
            ClassificationError::Disabled => {
                ApiError::ServiceUnavailable("AI analysis is not available".to_string())
            }
            other => ApiError::ServiceUnavailable(failure_message(&other)),
        }
    })?;

    Ok(Json(ClassifyResponse {
        category: classification.category,
        urgency: classification.urgency,
        effective_urgency: reconcile_urgency(text, true, Some(classification.urgency)),
    }))
}
