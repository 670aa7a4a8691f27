use thiserror::Error;

use crate::db::models::User;
use crate::db::types::{Category, ComplaintStatus, Urgency};
use crate::services::classification::ImageClassification;
use crate::services::urgency::reconcile_urgency;

pub(crate) const MIN_DESCRIPTION_CHARS: usize = 10;
const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum AssemblyError {
    #[error("Please select a category")]
    MissingCategory,
    #[error("Please describe the issue")]
    MissingDescription,
    #[error("Please provide more details (at least 10 characters)")]
    DescriptionTooShort,
    #[error("Please log in to submit a complaint")]
    NotAuthenticated,
}

/// Everything the form holds at submit time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ComplaintForm<'a> {
    pub(crate) description: &'a str,
    pub(crate) category: Option<Category>,
    pub(crate) room: Option<&'a str>,
    pub(crate) ai_completed: bool,
    pub(crate) urgency_from_ai: Option<Urgency>,
    pub(crate) image_classification: Option<&'a ImageClassification>,
    pub(crate) image_data: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewComplaint {
    pub(crate) user_id: String,
    pub(crate) user_name: String,
    pub(crate) user_room: String,
    pub(crate) category: Category,
    pub(crate) urgency: Urgency,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) location: String,
    pub(crate) status: ComplaintStatus,
    pub(crate) image_data: Option<String>,
    pub(crate) ai_analysis_text: Option<String>,
}

/// Validates the form and derives the record to persist. No I/O happens here.
pub(crate) fn assemble(
    form: ComplaintForm<'_>,
    author: Option<&User>,
) -> Result<NewComplaint, AssemblyError> {
    let category = form.category.ok_or(AssemblyError::MissingCategory)?;

    let description = form.description.trim();
    if description.is_empty() {
        return Err(AssemblyError::MissingDescription);
    }
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(AssemblyError::DescriptionTooShort);
    }

    let author = author.ok_or(AssemblyError::NotAuthenticated)?;

    let room = form
        .room
        .map(str::trim)
        .filter(|room| !room.is_empty())
        .unwrap_or(author.room.as_str())
        .to_string();

    Ok(NewComplaint {
        user_id: author.id.clone(),
        user_name: author.name.clone(),
        user_room: room.clone(),
        category,
        urgency: reconcile_urgency(description, form.ai_completed, form.urgency_from_ai),
        title: make_title(description),
        description: description.to_string(),
        location: room,
        status: ComplaintStatus::Pending,
        image_data: form.image_data.map(str::to_string),
        ai_analysis_text: form.image_classification.map(analysis_text),
    })
}

pub(crate) fn make_title(description: &str) -> String {
    if description.chars().count() > TITLE_MAX_CHARS {
        let head: String = description.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        description.to_string()
    }
}

pub(crate) fn analysis_text(analysis: &ImageClassification) -> String {
    let mut lines = vec![
        format!("Category: {}", analysis.category.as_str()),
        format!("Urgency: {}", analysis.urgency.as_str()),
    ];
    if !analysis.problem_description.is_empty() {
        lines.push(format!("Issue: {}", analysis.problem_description));
    }
    if !analysis.suggested_repair_steps.is_empty() {
        lines.push(format!("Suggested: {}", analysis.suggested_repair_steps));
    }
    lines.join("\n")
}
