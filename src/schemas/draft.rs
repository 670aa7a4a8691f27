use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_offset;
use crate::db::types::{Category, Urgency};
use crate::services::classification::{Classification, ImageClassification};
use crate::services::drafts::Draft;

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct DraftCreate {
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub(crate) room: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<Category>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct DraftUpdateRequest {
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub(crate) room: Option<String>,
}

/// `null` clears a manual choice and falls back to the inferred category.
#[derive(Debug, Deserialize)]
pub(crate) struct CategorySelection {
    pub(crate) category: Option<Category>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassifyRequest {
    #[validate(length(min = 1, max = 5000, message = "Text is required"))]
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassifyResponse {
    pub(crate) category: Category,
    pub(crate) urgency: Urgency,
    /// Urgency after the keyword rule is applied to the submitted text.
    pub(crate) effective_urgency: Urgency,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AnalysisStatus {
    None,
    Pending,
    Completed,
    Failed,
}

impl AnalysisStatus {
    fn from_result<T, E>(pending: bool, result: Option<&Result<T, E>>) -> Self {
        if pending {
            return Self::Pending;
        }
        match result {
            None => Self::None,
            Some(Ok(_)) => Self::Completed,
            Some(Err(_)) => Self::Failed,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DraftResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) room: Option<String>,
    pub(crate) category: Option<Category>,
    pub(crate) selected_category: Option<Category>,
    pub(crate) inferred_category: Option<Category>,
    pub(crate) ai_urgency: Option<Urgency>,
    pub(crate) preview_urgency: Urgency,
    pub(crate) text_analysis: AnalysisStatus,
    pub(crate) text_classification: Option<Classification>,
    pub(crate) image_analysis: AnalysisStatus,
    pub(crate) image_classification: Option<ImageClassification>,
    pub(crate) has_photo: bool,
    pub(crate) last_error: Option<String>,
    pub(crate) text_revision: u64,
    pub(crate) image_revision: u64,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl DraftResponse {
    /// `text_pending` is true while a debounced classification is queued for the draft.
    /// A photo without a result is only reported as pending when a classifier can answer.
    pub(crate) fn from_draft(draft: &Draft, text_pending: bool, classifier_enabled: bool) -> Self {
        let image_pending =
            classifier_enabled && draft.photo.is_some() && draft.image_result.is_none();

        Self {
            id: draft.id.to_string(),
            text: draft.text.clone(),
            room: draft.room.clone(),
            category: draft.category(),
            selected_category: draft.selected_category,
            inferred_category: draft.inferred_category(),
            ai_urgency: draft.ai_urgency(),
            preview_urgency: draft.preview_urgency(),
            text_analysis: AnalysisStatus::from_result(text_pending, draft.text_result.as_ref()),
            text_classification: draft
                .text_result
                .as_ref()
                .and_then(|result| result.as_ref().ok().copied()),
            image_analysis: AnalysisStatus::from_result(image_pending, draft.image_result.as_ref()),
            image_classification: draft.image_classification().cloned(),
            has_photo: draft.photo.is_some(),
            last_error: draft.last_error().map(str::to_string),
            text_revision: draft.text_revision,
            image_revision: draft.image_revision,
            created_at: format_offset(draft.created_at),
            updated_at: format_offset(draft.updated_at),
        }
    }
}
