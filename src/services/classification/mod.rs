mod client;
mod prompts;
pub(crate) mod reply;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::db::types::{Category, Urgency};

pub(crate) use client::OpenAiClassifier;
pub(crate) use reply::ReplyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Classification {
    pub(crate) category: Category,
    pub(crate) urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ImageClassification {
    pub(crate) category: Category,
    pub(crate) urgency: Urgency,
    pub(crate) problem_description: String,
    pub(crate) suggested_repair_steps: String,
    pub(crate) detected_location: Option<String>,
}

impl ImageClassification {
    pub(crate) fn as_classification(&self) -> Classification {
        Classification { category: self.category, urgency: self.urgency }
    }
}

/// A photo as sent to the model: base64 payload plus its MIME type.
#[derive(Debug, Clone)]
pub(crate) struct ImageInput {
    pub(crate) base64: String,
    pub(crate) mime_type: String,
}

impl ImageInput {
    pub(crate) fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

#[derive(Debug, Error)]
pub(crate) enum ClassificationError {
    #[error("classification is not configured")]
    Disabled,
    #[error("classification request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classification service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("classification service returned no content")]
    EmptyResponse,
    #[error(transparent)]
    Reply(#[from] ReplyError),
}

impl ClassificationError {
    /// Short label used for metrics and user-facing messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Transport(_) => "transport",
            Self::Api { .. } => "api_status",
            Self::EmptyResponse => "empty",
            Self::Reply(ReplyError::MissingField(_)) => "missing_field",
            Self::Reply(_) => "malformed",
        }
    }
}

/// One attempt per call; callers decide what a failure means for urgency.
#[async_trait]
pub(crate) trait Classifier: Send + Sync {
    /// Whether attempts can succeed at all; a disabled classifier is never scheduled.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn classify_text(&self, description: &str) -> Result<Classification, ClassificationError>;

    async fn classify_image(
        &self,
        image: &ImageInput,
    ) -> Result<ImageClassification, ClassificationError>;
}

/// Used when no endpoint is configured; every call fails with `Disabled`.
pub(crate) struct DisabledClassifier;

#[async_trait]
impl Classifier for DisabledClassifier {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn classify_text(&self, _description: &str) -> Result<Classification, ClassificationError> {
        Err(ClassificationError::Disabled)
    }

    async fn classify_image(
        &self,
        _image: &ImageInput,
    ) -> Result<ImageClassification, ClassificationError> {
        Err(ClassificationError::Disabled)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Returns queued results in order; `Disabled` once the queue is empty.
    #[derive(Default)]
    pub(crate) struct ScriptedClassifier {
        text: Mutex<Vec<Result<Classification, ClassificationError>>>,
        image: Mutex<Vec<Result<ImageClassification, ClassificationError>>>,
        pub(crate) text_calls: Mutex<Vec<String>>,
    }

    impl ScriptedClassifier {
        pub(crate) fn with_text(results: Vec<Result<Classification, ClassificationError>>) -> Self {
            let mut results = results;
            results.reverse();
            Self { text: Mutex::new(results), ..Self::default() }
        }

        pub(crate) fn with_image(
            results: Vec<Result<ImageClassification, ClassificationError>>,
        ) -> Self {
            let mut results = results;
            results.reverse();
            Self { image: Mutex::new(results), ..Self::default() }
        }
    }

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn classify_text(
            &self,
            description: &str,
        ) -> Result<Classification, ClassificationError> {
            self.text_calls.lock().unwrap().push(description.to_string());
            self.text.lock().unwrap().pop().unwrap_or(Err(ClassificationError::Disabled))
        }

        async fn classify_image(
            &self,
            _image: &ImageInput,
        ) -> Result<ImageClassification, ClassificationError> {
            self.image.lock().unwrap().pop().unwrap_or(Err(ClassificationError::Disabled))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_classifier_always_fails() {
        let classifier = DisabledClassifier;
        assert!(!classifier.is_enabled());

        let err = classifier.classify_text("Water leaking from the ceiling").await.unwrap_err();
        assert_eq!(err.kind(), "disabled");

        let image = ImageInput { base64: "AAAA".to_string(), mime_type: "image/png".to_string() };
        assert!(classifier.classify_image(&image).await.is_err());
    }

    #[test]
    fn data_url_carries_mime_type() {
        let image = ImageInput { base64: "AAAA".to_string(), mime_type: "image/png".to_string() };

        assert_eq!(image.data_url(), "data:image/png;base64,AAAA");
    }
}
