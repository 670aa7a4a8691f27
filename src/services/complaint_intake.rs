use thiserror::Error;
use uuid::Uuid;

use crate::core::metrics::{COMPLAINTS_SUBMITTED_TOTAL, URGENCY_KEYWORD_OVERRIDES_TOTAL};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Complaint, User};
use crate::db::types::{Category, Urgency};
use crate::repositories;
use crate::services::assembly::{assemble, AssemblyError, ComplaintForm, NewComplaint};
use crate::services::classification::{ClassificationError, Classifier};
use crate::services::drafts::{
    ApplyResult, ClassificationOutcome, Draft, DraftError, DraftPhoto, DraftStore,
};
use crate::services::photos::{self, PhotoError};

#[derive(Debug, Error)]
pub(crate) enum SubmitError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error("failed to save complaint: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub(crate) struct DirectSubmission {
    pub(crate) description: String,
    pub(crate) category: Option<Category>,
    pub(crate) room: Option<String>,
    pub(crate) image_base64: Option<String>,
}

pub(crate) fn failure_message(err: &ClassificationError) -> String {
    match err {
        ClassificationError::Disabled => "AI analysis is not available".to_string(),
        other => format!("AI analysis failed ({}); urgency falls back to keywords", other.kind()),
    }
}

/// Debounces a text classification for the draft's current revision. Text
/// below the threshold only cancels whatever was pending.
pub(crate) fn schedule_text_classification(state: &AppState, draft: &Draft) -> bool {
    let min_chars = state.settings().classification().min_text_chars;
    if !state.classifier().is_enabled() || draft.text.trim().chars().count() < min_chars {
        state.debouncer().cancel(&draft.id);
        return false;
    }

    let classifier = state.classifier().clone();
    let drafts = state.drafts().clone();
    let (draft_id, revision, text) = (draft.id, draft.text_revision, draft.text.clone());

    state.debouncer().schedule(draft.id, move || async move {
        classify_draft_text(classifier.as_ref(), &drafts, draft_id, revision, &text).await;
    });
    tracing::debug!(draft_id = %draft.id, revision, "Scheduled text classification");
    true
}

pub(crate) async fn classify_draft_text(
    classifier: &dyn Classifier,
    drafts: &DraftStore,
    draft_id: Uuid,
    revision: u64,
    text: &str,
) -> ApplyResult {
    let result = classifier.classify_text(text).await.map_err(|err| failure_message(&err));
    let applied = drafts.apply(draft_id, ClassificationOutcome::Text { revision, result }).await;

    if applied != ApplyResult::Applied {
        tracing::debug!(
            draft_id = %draft_id,
            revision,
            result = ?applied,
            "Dropped text classification"
        );
    }
    applied
}

/// Image attempts run in the background right away; there is no debounce.
pub(crate) fn spawn_photo_classification(state: &AppState, draft: &Draft, revision: u64) -> bool {
    let Some(photo) = draft.photo.as_ref() else {
        return false;
    };
    if !state.classifier().is_enabled() {
        return false;
    }

    let classifier = state.classifier().clone();
    let drafts = state.drafts().clone();
    let draft_id = draft.id;
    let photo = photo.clone();

    tokio::spawn(async move {
        classify_draft_photo(classifier.as_ref(), &drafts, draft_id, revision, &photo).await;
    });
    true
}

pub(crate) async fn classify_draft_photo(
    classifier: &dyn Classifier,
    drafts: &DraftStore,
    draft_id: Uuid,
    revision: u64,
    photo: &DraftPhoto,
) -> ApplyResult {
    let image = photos::image_input(photo);
    let result = classifier.classify_image(&image).await.map_err(|err| failure_message(&err));
    let applied = drafts.apply(draft_id, ClassificationOutcome::Image { revision, result }).await;

    if applied != ApplyResult::Applied {
        tracing::debug!(
            draft_id = %draft_id,
            revision,
            result = ?applied,
            "Dropped image classification"
        );
    }
    applied
}

/// The draft leaves the store before anything is persisted, so a second
/// submit of the same draft gets `NotFound`. On failure it is put back.
pub(crate) async fn submit_draft(
    state: &AppState,
    user: &User,
    draft_id: Uuid,
) -> Result<Complaint, SubmitError> {
    let draft = state.drafts().take(draft_id, &user.id).await?;

    let result: Result<Complaint, SubmitError> = async {
        let complaint = assemble(draft.form(), Some(user))?;
        Ok(persist(state, &complaint, draft.ai_completed(), draft.ai_urgency()).await?)
    }
    .await;

    match result {
        Ok(saved) => {
            state.debouncer().cancel(&draft_id);
            Ok(saved)
        }
        Err(err) => {
            state.drafts().restore(draft).await;
            Err(err)
        }
    }
}

/// One-shot submission without a draft. The text is classified inline when it is
/// long enough; a failed attempt leaves urgency to the keywords.
pub(crate) async fn submit_direct(
    state: &AppState,
    user: &User,
    submission: DirectSubmission,
) -> Result<Complaint, SubmitError> {
    let photo = match submission.image_base64.as_deref().map(str::trim) {
        Some(encoded) if !encoded.is_empty() => {
            Some(photos::prepare_inline(state.settings(), encoded)?)
        }
        _ => None,
    };

    let mut form = ComplaintForm {
        description: &submission.description,
        category: submission.category,
        room: submission.room.as_deref(),
        ai_completed: false,
        urgency_from_ai: None,
        image_classification: None,
        image_data: photo.as_ref().map(|photo| photo.base64.as_str()),
    };
    assemble(form, Some(user))?;

    let classifier = state.classifier();
    let text = submission.description.trim();
    if classifier.is_enabled()
        && text.chars().count() >= state.settings().classification().min_text_chars
    {
        match classifier.classify_text(text).await {
            Ok(classification) => {
                form.ai_completed = true;
                form.urgency_from_ai = Some(classification.urgency);
            }
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "Inline classification failed");
            }
        }
    }

    let complaint = assemble(form, Some(user))?;
    let saved = persist(state, &complaint, form.ai_completed, form.urgency_from_ai).await?;
    Ok(saved)
}

async fn persist(
    state: &AppState,
    complaint: &NewComplaint,
    ai_completed: bool,
    urgency_from_ai: Option<Urgency>,
) -> Result<Complaint, sqlx::Error> {
    if ai_completed && urgency_from_ai == Some(Urgency::Low) && complaint.urgency == Urgency::High
    {
        metrics::counter!(URGENCY_KEYWORD_OVERRIDES_TOTAL).increment(1);
        tracing::info!(user_id = %complaint.user_id, "High-urgency keyword overrode AI urgency");
    }

    let id = Uuid::new_v4().to_string();
    let saved = repositories::complaints::create(
        state.db(),
        repositories::complaints::CreateComplaint {
            id: &id,
            user_id: &complaint.user_id,
            user_name: &complaint.user_name,
            user_room: &complaint.user_room,
            category: complaint.category,
            urgency: complaint.urgency,
            title: &complaint.title,
            description: &complaint.description,
            location: &complaint.location,
            status: complaint.status,
            image_data: complaint.image_data.as_deref(),
            ai_analysis_text: complaint.ai_analysis_text.as_deref(),
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    metrics::counter!(COMPLAINTS_SUBMITTED_TOTAL, "urgency" => saved.urgency.as_str()).increment(1);
    tracing::info!(
        complaint_id = %saved.id,
        user_id = %saved.user_id,
        category = saved.category.as_str(),
        urgency = saved.urgency.as_str(),
        "Complaint submitted"
    );
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::services::classification::testing::ScriptedClassifier;
    use crate::services::classification::{Classification, ImageClassification};
    use crate::test_support;

    fn photo() -> DraftPhoto {
        DraftPhoto {
            base64: "AAAA".to_string(),
            mime_type: "image/jpeg".to_string(),
            sha256: "hash".to_string(),
            size_bytes: 3,
        }
    }

    #[tokio::test]
    async fn failed_text_attempt_is_recorded_as_failure() {
        let classifier = ScriptedClassifier::with_text(vec![Err(ClassificationError::EmptyResponse)]);
        let drafts = DraftStore::new(5);
        let draft = drafts
            .create("u1", Some("Smoke is coming from the fuse box".into()), None, None)
            .await
            .unwrap();

        let applied =
            classify_draft_text(&classifier, &drafts, draft.id, draft.text_revision, &draft.text)
                .await;

        assert_eq!(applied, ApplyResult::Applied);
        let draft = drafts.get(draft.id, "u1").await.unwrap();
        assert!(!draft.ai_completed());
        assert!(draft.last_error().unwrap().contains("empty"));
        assert_eq!(draft.preview_urgency(), Urgency::High);
    }

    #[tokio::test]
    async fn photo_result_for_replaced_photo_is_stale() {
        let analysis = ImageClassification {
            category: Category::Electricity,
            urgency: Urgency::High,
            problem_description: "Burnt socket".to_string(),
            suggested_repair_steps: "Replace socket".to_string(),
            detected_location: None,
        };
        let classifier = ScriptedClassifier::with_image(vec![Ok(analysis)]);
        let drafts = DraftStore::new(5);
        let draft = drafts.create("u1", None, None, None).await.unwrap();
        drafts.attach_photo(draft.id, "u1", photo()).await.unwrap();
        drafts.remove_photo(draft.id, "u1").await.unwrap();

        let applied = classify_draft_photo(&classifier, &drafts, draft.id, 1, &photo()).await;

        assert_eq!(applied, ApplyResult::Stale);
        let draft = drafts.get(draft.id, "u1").await.unwrap();
        assert!(draft.image_classification().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn text_edits_are_debounced_into_one_call() {
        let classifier = Arc::new(ScriptedClassifier::with_text(vec![Ok(Classification {
            category: Category::Water,
            urgency: Urgency::Low,
        })]));
        let state = test_support::state_with_classifier(classifier.clone()).await;
        let draft = state.drafts().create("u1", None, None, None).await.unwrap();

        for text in [
            "The tap in my bathroom",
            "The tap in my bathroom drips",
            "The tap in my bathroom drips slowly",
        ] {
            let update = crate::services::drafts::DraftUpdate {
                text: Some(text.to_string()),
                room: None,
            };
            let (snapshot, _) = state.drafts().update(draft.id, "u1", update).await.unwrap();
            assert!(schedule_text_classification(&state, &snapshot));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(
            *classifier.text_calls.lock().unwrap(),
            vec!["The tap in my bathroom drips slowly".to_string()]
        );
        let draft = state.drafts().get(draft.id, "u1").await.unwrap();
        assert_eq!(draft.category(), Some(Category::Water));
        assert_eq!(draft.preview_urgency(), Urgency::Low);
    }

    #[tokio::test(start_paused = true)]
    async fn short_text_cancels_pending_classification() {
        let classifier = Arc::new(ScriptedClassifier::default());
        let state = test_support::state_with_classifier(classifier.clone()).await;
        let draft = state
            .drafts()
            .create("u1", Some("Corridor bulb has been out for days".into()), None, None)
            .await
            .unwrap();

        assert!(schedule_text_classification(&state, &draft));
        let update = crate::services::drafts::DraftUpdate { text: Some("Bulb".into()), room: None };
        let (snapshot, _) = state.drafts().update(draft.id, "u1", update).await.unwrap();
        assert!(!schedule_text_classification(&state, &snapshot));

        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert!(classifier.text_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_classifier_is_never_scheduled() {
        let state = test_support::state_with_classifier(Arc::new(
            crate::services::classification::DisabledClassifier,
        ))
        .await;
        let draft = state
            .drafts()
            .create("u1", Some("Corridor bulb has been out for days".into()), None, None)
            .await
            .unwrap();

        assert!(!schedule_text_classification(&state, &draft));
        assert!(!state.debouncer().is_pending(&draft.id));
    }

    #[tokio::test]
    async fn missing_category_fails_before_any_io() {
        let classifier = Arc::new(ScriptedClassifier::default());
        let state = test_support::state_with_classifier(classifier.clone()).await;
        let user = test_support::sample_user("u1", false);

        let err = submit_direct(
            &state,
            &user,
            DirectSubmission {
                description: "Corridor bulb has been out for days".to_string(),
                category: None,
                room: None,
                image_base64: None,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SubmitError::Assembly(AssemblyError::MissingCategory)));
        assert!(classifier.text_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn draft_without_category_or_classification_is_rejected() {
        let state = test_support::state_with_classifier(Arc::new(ScriptedClassifier::default()))
            .await;
        let user = test_support::sample_user("u1", false);
        let draft = state
            .drafts()
            .create("u1", Some("Corridor bulb has been out for days".into()), None, None)
            .await
            .unwrap();

        let err = submit_draft(&state, &user, draft.id).await.unwrap_err();

        assert!(matches!(err, SubmitError::Assembly(AssemblyError::MissingCategory)));
        assert_eq!(state.drafts().len().await, 1);
    }
}
