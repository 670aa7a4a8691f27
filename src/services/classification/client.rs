use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::core::metrics::{CLASSIFICATION_DURATION_SECONDS, CLASSIFICATION_REQUESTS_TOTAL};

use super::prompts::{text_prompt, IMAGE_PROMPT};
use super::reply::{parse_classification, parse_image_classification};
use super::{Classification, ClassificationError, Classifier, ImageClassification, ImageInput};

#[derive(Debug, Clone)]
pub(crate) struct OpenAiClassifier {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiClassifier {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let ai = settings.ai();
        Self::new(
            &ai.openai_base_url,
            &ai.openai_api_key,
            &ai.ai_model,
            ai.ai_max_tokens,
            ai.ai_temperature,
            Duration::from_secs(ai.ai_request_timeout),
        )
    }

    pub(crate) fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        max_tokens: u32,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens,
            temperature,
        })
    }

    async fn complete(
        &self,
        kind: &'static str,
        content: Value,
    ) -> Result<String, ClassificationError> {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": content}],
            "max_completion_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let timer = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);
        let result = self.send(&url, &payload).await;

        let elapsed = timer.elapsed().as_secs_f64();
        metrics::histogram!(CLASSIFICATION_DURATION_SECONDS, "kind" => kind).record(elapsed);

        match &result {
            Ok(_) => {
                tracing::debug!(kind, duration_seconds = elapsed, "Classification reply received")
            }
            Err(err) => tracing::warn!(
                kind,
                error = %err,
                duration_seconds = elapsed,
                "Classification request failed"
            ),
        }

        result
    }

    async fn send(&self, url: &str, payload: &Value) -> Result<String, ClassificationError> {
        let response =
            self.client.post(url).bearer_auth(&self.api_key).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Api { status: status.as_u16(), body });
        }

        let body: Value = response.json().await?;
        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or(ClassificationError::EmptyResponse)
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify_text(&self, description: &str) -> Result<Classification, ClassificationError> {
        let result = self
            .complete("text", Value::String(text_prompt(description)))
            .await
            .and_then(|content| parse_classification(&content).map_err(Into::into));

        record_outcome("text", &result);
        result
    }

    async fn classify_image(
        &self,
        image: &ImageInput,
    ) -> Result<ImageClassification, ClassificationError> {
        let content = json!([
            {"type": "image_url", "image_url": {"url": image.data_url()}},
            {"type": "text", "text": IMAGE_PROMPT}
        ]);

        let result = self
            .complete("image", content)
            .await
            .and_then(|content| parse_image_classification(&content).map_err(Into::into));

        record_outcome("image", &result);
        result
    }
}

fn record_outcome<T>(kind: &'static str, result: &Result<T, ClassificationError>) {
    let label = match result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    metrics::counter!(CLASSIFICATION_REQUESTS_TOTAL, "kind" => kind, "result" => label).increment(1);
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

    use super::*;
    use crate::db::types::{Category, Urgency};

    #[derive(Clone)]
    struct FakeUpstream {
        status: StatusCode,
        reply: Value,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn chat_completions(
        State(upstream): State<FakeUpstream>,
        headers: axum::http::HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        upstream.seen.lock().unwrap().push((auth, body));
        (upstream.status, Json(upstream.reply.clone()))
    }

    async fn spawn_upstream(
        status: StatusCode,
        reply: Value,
    ) -> (OpenAiClassifier, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let upstream = FakeUpstream { status, reply, seen: seen.clone() };
        let app =
            Router::new().route("/v1/chat/completions", post(chat_completions)).with_state(upstream);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let classifier = OpenAiClassifier::new(
            &format!("http://{addr}/v1/"),
            "test-key",
            "gemini-2.0-flash",
            1024,
            0.2,
            Duration::from_secs(5),
        )
        .expect("classifier");

        (classifier, seen)
    }

    fn completion(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[tokio::test]
    async fn classify_text_sends_single_prompt_and_parses_reply() {
        let (classifier, seen) = spawn_upstream(
            StatusCode::OK,
            completion("```json\n{\"category\":\"water\",\"urgency\":\"high\"}\n```"),
        )
        .await;

        let result = classifier.classify_text("Pipe burst in the washroom").await.unwrap();

        assert_eq!(result, Classification { category: Category::Water, urgency: Urgency::High });
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer test-key"));
        assert_eq!(body["model"], "gemini-2.0-flash");
        assert_eq!(body["max_completion_tokens"], 1024);
        assert_eq!(body["temperature"], 0.2);
        let prompt = body["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("Complaint: \"Pipe burst in the washroom\""));
    }

    #[tokio::test]
    async fn classify_image_sends_data_url() {
        let (classifier, seen) = spawn_upstream(
            StatusCode::OK,
            completion(
                r#"{"category":"electricity","urgency":"high","problemDescription":"Exposed wires near switchboard","suggestedRepairSteps":"Isolate the circuit"}"#,
            ),
        )
        .await;

        let image = ImageInput { base64: "iVBORw0K".to_string(), mime_type: "image/png".to_string() };
        let result = classifier.classify_image(&image).await.unwrap();

        assert_eq!(result.category, Category::Electricity);
        assert_eq!(result.problem_description, "Exposed wires near switchboard");
        assert_eq!(result.detected_location, None);
        let seen = seen.lock().unwrap();
        let parts = &seen[0].1["messages"][0]["content"];
        assert_eq!(parts[0]["image_url"]["url"], "data:image/png;base64,iVBORw0K");
        assert_eq!(parts[1]["type"], "text");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_without_retry() {
        let (classifier, seen) =
            spawn_upstream(StatusCode::TOO_MANY_REQUESTS, json!({"error": "quota"})).await;

        let err = classifier.classify_text("Lights flicker in corridor").await.unwrap_err();

        assert!(matches!(err, ClassificationError::Api { status: 429, .. }));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let (classifier, _) = spawn_upstream(StatusCode::OK, completion("   ")).await;

        let err = classifier.classify_text("Lights flicker in corridor").await.unwrap_err();

        assert!(matches!(err, ClassificationError::EmptyResponse));
    }

    #[tokio::test]
    async fn unparseable_reply_is_an_error_on_both_paths() {
        let (classifier, _) =
            spawn_upstream(StatusCode::OK, completion("Sorry, I cannot help with that.")).await;

        let text_err = classifier.classify_text("Lights flicker in corridor").await.unwrap_err();
        let image = ImageInput { base64: "AAAA".to_string(), mime_type: "image/jpeg".to_string() };
        let image_err = classifier.classify_image(&image).await.unwrap_err();

        assert_eq!(text_err.kind(), "malformed");
        assert_eq!(image_err.kind(), "malformed");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let classifier = OpenAiClassifier::new(
            &format!("http://{addr}"),
            "test-key",
            "gemini-2.0-flash",
            1024,
            0.2,
            Duration::from_secs(2),
        )
        .expect("classifier");

        let err = classifier.classify_text("Lights flicker in corridor").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
