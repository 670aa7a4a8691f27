use serde_json::{Map, Value};
use thiserror::Error;

use crate::db::types::{Category, Urgency};

use super::{Classification, ImageClassification};

pub(crate) const DEFAULT_PROBLEM_DESCRIPTION: &str = "Issue detected in image";
pub(crate) const DEFAULT_REPAIR_STEPS: &str = "Please contact maintenance staff";

#[derive(Debug, Error)]
pub(crate) enum ReplyError {
    #[error("reply is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("reply is missing the `{0}` field")]
    MissingField(&'static str),
}

/// Strips a surrounding code fence and a leading `json` marker from a model reply.
pub(crate) fn extract_json_payload(raw: &str) -> &str {
    let mut payload = raw.trim();

    if let Some(rest) = payload.strip_prefix("```") {
        payload = match rest.rfind("```") {
            Some(end) => &rest[..end],
            None => rest,
        };
        payload = payload.trim_start();
    }
    if let Some(rest) = payload.strip_prefix("json") {
        payload = rest;
    }

    payload.trim()
}

/// Unknown labels fall back to `maintenance`.
pub(crate) fn normalize_category(value: &str) -> Category {
    Category::parse(value).unwrap_or_else(|| {
        tracing::warn!(category = %value, "Unknown category in reply; using maintenance");
        Category::Maintenance
    })
}

/// `medium` and unknown labels fall back to `low`.
pub(crate) fn normalize_urgency(value: &str) -> Urgency {
    Urgency::parse(value).unwrap_or_else(|| {
        tracing::warn!(urgency = %value, "Unsupported urgency in reply; using low");
        Urgency::Low
    })
}

pub(crate) fn parse_classification(raw: &str) -> Result<Classification, ReplyError> {
    let object = parse_object(raw)?;
    let category = required_label(&object, "category")?;
    let urgency = required_label(&object, "urgency")?;

    Ok(Classification {
        category: normalize_category(&category),
        urgency: normalize_urgency(&urgency),
    })
}

pub(crate) fn parse_image_classification(raw: &str) -> Result<ImageClassification, ReplyError> {
    let object = parse_object(raw)?;
    let category = required_label(&object, "category")?;
    let urgency = required_label(&object, "urgency")?;

    let problem_description = optional_text(&object, "problemDescription")
        .unwrap_or_else(|| DEFAULT_PROBLEM_DESCRIPTION.to_string());
    let suggested_repair_steps = optional_text(&object, "suggestedRepairSteps")
        .unwrap_or_else(|| DEFAULT_REPAIR_STEPS.to_string());

    Ok(ImageClassification {
        category: normalize_category(&category),
        urgency: normalize_urgency(&urgency),
        problem_description,
        suggested_repair_steps,
        detected_location: optional_text(&object, "detectedLocation"),
    })
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, ReplyError> {
    match serde_json::from_str::<Value>(extract_json_payload(raw))? {
        Value::Object(object) => Ok(object),
        _ => Err(ReplyError::NotAnObject),
    }
}

fn required_label(object: &Map<String, Value>, key: &'static str) -> Result<String, ReplyError> {
    match object.get(key) {
        None | Some(Value::Null) => Err(ReplyError::MissingField(key)),
        Some(Value::String(value)) => Ok(value.to_lowercase()),
        Some(other) => Ok(other.to_string().to_lowercase()),
    }
}

fn optional_text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
