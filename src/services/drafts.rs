use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::types::{Category, Urgency};
use crate::services::assembly::ComplaintForm;
use crate::services::classification::{Classification, ImageClassification};
use crate::services::urgency::reconcile_urgency;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DraftError {
    #[error("Draft not found")]
    NotFound,
    #[error("Draft belongs to another user")]
    Forbidden,
    #[error("Too many open drafts (limit {0})")]
    LimitReached(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DraftPhoto {
    pub(crate) base64: String,
    pub(crate) mime_type: String,
    pub(crate) sha256: String,
    pub(crate) size_bytes: usize,
}

/// Result of one classification attempt, stamped with the revision of the
/// input it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClassificationOutcome {
    Text { revision: u64, result: Result<Classification, String> },
    Image { revision: u64, result: Result<ImageClassification, String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApplyResult {
    Applied,
    Stale,
    DraftGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhotoChange {
    /// New image; classify it against this image revision.
    Classify { revision: u64 },
    /// Same bytes as the current photo; the existing analysis stands.
    Unchanged,
}

#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub(crate) id: Uuid,
    pub(crate) owner_id: String,
    pub(crate) text: String,
    pub(crate) room: Option<String>,
    pub(crate) selected_category: Option<Category>,
    pub(crate) photo: Option<DraftPhoto>,
    pub(crate) text_revision: u64,
    pub(crate) image_revision: u64,
    pub(crate) text_result: Option<Result<Classification, String>>,
    pub(crate) image_result: Option<Result<ImageClassification, String>>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl Draft {
    fn new(owner_id: &str, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            text: String::new(),
            room: None,
            selected_category: None,
            photo: None,
            text_revision: 0,
            image_revision: 0,
            text_result: None,
            image_result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn image_classification(&self) -> Option<&ImageClassification> {
        self.image_result.as_ref().and_then(|result| result.as_ref().ok())
    }

    /// The image result wins over the text result when both succeeded.
    pub(crate) fn ai_classification(&self) -> Option<Classification> {
        self.image_classification()
            .map(ImageClassification::as_classification)
            .or_else(|| self.text_result.as_ref().and_then(|result| result.as_ref().ok().copied()))
    }

    pub(crate) fn inferred_category(&self) -> Option<Category> {
        self.ai_classification().map(|classification| classification.category)
    }

    pub(crate) fn category(&self) -> Option<Category> {
        self.selected_category.or_else(|| self.inferred_category())
    }

    pub(crate) fn ai_urgency(&self) -> Option<Urgency> {
        self.ai_classification().map(|classification| classification.urgency)
    }

    pub(crate) fn ai_completed(&self) -> bool {
        self.ai_classification().is_some()
    }

    pub(crate) fn preview_urgency(&self) -> Urgency {
        reconcile_urgency(&self.text, self.ai_completed(), self.ai_urgency())
    }

    pub(crate) fn last_error(&self) -> Option<&str> {
        let image_error = self.image_result.as_ref().and_then(|result| result.as_ref().err());
        let text_error = self.text_result.as_ref().and_then(|result| result.as_ref().err());
        image_error.or(text_error).map(String::as_str)
    }

    pub(crate) fn form(&self) -> ComplaintForm<'_> {
        ComplaintForm {
            description: &self.text,
            category: self.category(),
            room: self.room.as_deref(),
            ai_completed: self.ai_completed(),
            urgency_from_ai: self.ai_urgency(),
            image_classification: self.image_classification(),
            image_data: self.photo.as_ref().map(|photo| photo.base64.as_str()),
        }
    }

    /// A text result describes the text it was computed from, so it is
    /// dropped with that text.
    fn set_text(&mut self, text: String) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text;
        self.text_revision += 1;
        self.text_result = None;
        true
    }

    fn apply(&mut self, outcome: ClassificationOutcome) -> ApplyResult {
        match outcome {
            ClassificationOutcome::Text { revision, result } => {
                if revision != self.text_revision {
                    return ApplyResult::Stale;
                }
                self.text_result = Some(result);
            }
            ClassificationOutcome::Image { revision, result } => {
                if revision != self.image_revision || self.photo.is_none() {
                    return ApplyResult::Stale;
                }
                if let Ok(analysis) = &result {
                    if self.text.trim().is_empty() {
                        self.set_text(analysis.problem_description.clone());
                    }
                }
                self.image_result = Some(result);
            }
        }
        ApplyResult::Applied
    }
}

#[derive(Debug, Default)]
pub(crate) struct DraftUpdate {
    pub(crate) text: Option<String>,
    pub(crate) room: Option<String>,
}

/// In-memory drafts keyed by id. Every accessor checks ownership; snapshots
/// handed out are clones.
#[derive(Clone)]
pub(crate) struct DraftStore {
    drafts: Arc<RwLock<HashMap<Uuid, Draft>>>,
    max_per_user: usize,
}

impl DraftStore {
    pub(crate) fn new(max_per_user: usize) -> Self {
        Self { drafts: Arc::new(RwLock::new(HashMap::new())), max_per_user }
    }

    pub(crate) async fn create(
        &self,
        owner_id: &str,
        text: Option<String>,
        room: Option<String>,
        category: Option<Category>,
    ) -> Result<Draft, DraftError> {
        let mut drafts = self.drafts.write().await;
        let open = drafts.values().filter(|draft| draft.owner_id == owner_id).count();
        if open >= self.max_per_user {
            return Err(DraftError::LimitReached(self.max_per_user));
        }

        let mut draft = Draft::new(owner_id, OffsetDateTime::now_utc());
        if let Some(text) = text {
            draft.set_text(text);
        }
        draft.room = room;
        draft.selected_category = category;

        drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    pub(crate) async fn get(&self, id: Uuid, owner_id: &str) -> Result<Draft, DraftError> {
        let drafts = self.drafts.read().await;
        let draft = drafts.get(&id).ok_or(DraftError::NotFound)?;
        if draft.owner_id != owner_id {
            return Err(DraftError::Forbidden);
        }
        Ok(draft.clone())
    }

    /// Returns the snapshot and whether the text changed.
    pub(crate) async fn update(
        &self,
        id: Uuid,
        owner_id: &str,
        update: DraftUpdate,
    ) -> Result<(Draft, bool), DraftError> {
        self.modify(id, owner_id, |draft| {
            let text_changed = update.text.map(|text| draft.set_text(text)).unwrap_or(false);
            if let Some(room) = update.room {
                draft.room = Some(room).filter(|room| !room.trim().is_empty());
            }
            text_changed
        })
        .await
    }

    pub(crate) async fn select_category(
        &self,
        id: Uuid,
        owner_id: &str,
        category: Option<Category>,
    ) -> Result<Draft, DraftError> {
        self.modify(id, owner_id, |draft| draft.selected_category = category)
            .await
            .map(|(draft, _)| draft)
    }

    pub(crate) async fn attach_photo(
        &self,
        id: Uuid,
        owner_id: &str,
        photo: DraftPhoto,
    ) -> Result<(Draft, PhotoChange), DraftError> {
        self.modify(id, owner_id, |draft| {
            let same_image =
                draft.photo.as_ref().is_some_and(|current| current.sha256 == photo.sha256);
            if same_image && draft.image_result.is_some() {
                return PhotoChange::Unchanged;
            }
            draft.photo = Some(photo);
            draft.image_revision += 1;
            draft.image_result = None;
            PhotoChange::Classify { revision: draft.image_revision }
        })
        .await
    }

    pub(crate) async fn remove_photo(&self, id: Uuid, owner_id: &str) -> Result<Draft, DraftError> {
        self.modify(id, owner_id, |draft| {
            if draft.photo.take().is_some() {
                draft.image_revision += 1;
            }
            draft.image_result = None;
        })
        .await
        .map(|(draft, _)| draft)
    }

    /// Records a finished attempt unless the draft is gone or has moved on.
    pub(crate) async fn apply(&self, id: Uuid, outcome: ClassificationOutcome) -> ApplyResult {
        let mut drafts = self.drafts.write().await;
        let Some(draft) = drafts.get_mut(&id) else {
            return ApplyResult::DraftGone;
        };

        let result = draft.apply(outcome);
        if result == ApplyResult::Applied {
            draft.updated_at = OffsetDateTime::now_utc();
        }
        result
    }

    pub(crate) async fn discard(&self, id: Uuid, owner_id: &str) -> Result<Draft, DraftError> {
        let mut drafts = self.drafts.write().await;
        match drafts.get(&id) {
            None => Err(DraftError::NotFound),
            Some(draft) if draft.owner_id != owner_id => Err(DraftError::Forbidden),
            Some(_) => drafts.remove(&id).ok_or(DraftError::NotFound),
        }
    }

    /// Removes the draft for submission. Concurrent takes of one draft see
    /// `NotFound` after the first.
    pub(crate) async fn take(&self, id: Uuid, owner_id: &str) -> Result<Draft, DraftError> {
        self.discard(id, owner_id).await
    }

    /// Puts back a draft whose submission failed, unless the id was reused.
    pub(crate) async fn restore(&self, draft: Draft) {
        self.drafts.write().await.entry(draft.id).or_insert(draft);
    }

    /// Removes drafts untouched since `cutoff`; returns their ids.
    pub(crate) async fn purge_idle(&self, cutoff: OffsetDateTime) -> Vec<Uuid> {
        let mut drafts = self.drafts.write().await;
        let expired: Vec<Uuid> = drafts
            .values()
            .filter(|draft| draft.updated_at < cutoff)
            .map(|draft| draft.id)
            .collect();
        for id in &expired {
            drafts.remove(id);
        }
        expired
    }

    pub(crate) async fn len(&self) -> usize {
        self.drafts.read().await.len()
    }

    async fn modify<T>(
        &self,
        id: Uuid,
        owner_id: &str,
        change: impl FnOnce(&mut Draft) -> T,
    ) -> Result<(Draft, T), DraftError> {
        let mut drafts = self.drafts.write().await;
        let draft = drafts.get_mut(&id).ok_or(DraftError::NotFound)?;
        if draft.owner_id != owner_id {
            return Err(DraftError::Forbidden);
        }

        let value = change(draft);
        draft.updated_at = OffsetDateTime::now_utc();
        Ok((draft.clone(), value))
    }
}
