use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::core::time::format_primitive;
use crate::db::models::Complaint;
use crate::db::types::{Category, ComplaintStatus, Urgency};
use crate::repositories::complaints::{ComplaintFilter, ComplaintStats};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ComplaintCreate {
    #[serde(alias = "text")]
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) category: Option<Category>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub(crate) room: Option<String>,
    #[serde(default)]
    #[serde(alias = "imageData", alias = "image_data")]
    pub(crate) image_base64: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StatusUpdateRequest {
    pub(crate) status: ComplaintStatus,
    #[serde(default)]
    #[serde(alias = "adminNotes")]
    #[validate(length(max = 2000, message = "Notes are too long"))]
    pub(crate) admin_notes: Option<String>,
}

/// Dashboard shortcuts: `all`, `pending`, `in_progress`, `resolved`, `high`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ListPreset {
    All,
    Pending,
    InProgress,
    Resolved,
    High,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComplaintListQuery {
    #[serde(default)]
    pub(crate) filter: Option<ListPreset>,
    #[serde(default)]
    pub(crate) status: Option<ComplaintStatus>,
    #[serde(default)]
    pub(crate) urgency: Option<Urgency>,
    #[serde(default)]
    pub(crate) category: Option<Category>,
    #[serde(default)]
    pub(crate) active: Option<bool>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl ComplaintListQuery {
    pub(crate) fn into_filter(self, user_id: Option<String>) -> ComplaintFilter {
        let mut filter = ComplaintFilter {
            user_id,
            status: self.status,
            urgency: self.urgency,
            category: self.category,
            active: self.active.unwrap_or(false),
            search: self.search,
            skip: self.skip,
            limit: self.limit,
        };

        match self.filter {
            Some(ListPreset::Pending) => filter.status = Some(ComplaintStatus::Pending),
            Some(ListPreset::InProgress) => filter.status = Some(ComplaintStatus::InProgress),
            Some(ListPreset::Resolved) => filter.status = Some(ComplaintStatus::Resolved),
            Some(ListPreset::High) => filter.urgency = Some(Urgency::High),
            Some(ListPreset::All) | None => {}
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ComplaintResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) user_name: String,
    pub(crate) user_room: String,
    pub(crate) category: Category,
    pub(crate) urgency: Urgency,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) location: String,
    pub(crate) status: ComplaintStatus,
    pub(crate) admin_notes: String,
    pub(crate) image_data: Option<String>,
    pub(crate) ai_analysis_text: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ComplaintResponse {
    pub(crate) fn from_db(complaint: Complaint) -> Self {
        Self {
            id: complaint.id,
            user_id: complaint.user_id,
            user_name: complaint.user_name,
            user_room: complaint.user_room,
            category: complaint.category,
            urgency: complaint.urgency,
            title: complaint.title,
            description: complaint.description,
            location: complaint.location,
            status: complaint.status,
            admin_notes: complaint.admin_notes,
            image_data: complaint.image_data,
            ai_analysis_text: complaint.ai_analysis_text,
            created_at: format_primitive(complaint.created_at),
            updated_at: format_primitive(complaint.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatsResponse {
    pub(crate) total: i64,
    pub(crate) pending: i64,
    pub(crate) in_progress: i64,
    pub(crate) resolved: i64,
    pub(crate) cancelled: i64,
    pub(crate) high_urgency: i64,
    pub(crate) low_urgency: i64,
    pub(crate) by_category: BTreeMap<&'static str, i64>,
}

impl StatsResponse {
    pub(crate) fn from_stats(stats: ComplaintStats) -> Self {
        let status_count = |status: ComplaintStatus| {
            stats.by_status.iter().find(|(item, _)| *item == status).map_or(0, |(_, n)| *n)
        };
        let urgency_count = |urgency: Urgency| {
            stats.by_urgency.iter().find(|(item, _)| *item == urgency).map_or(0, |(_, n)| *n)
        };

        let mut by_category: BTreeMap<&'static str, i64> =
            Category::ALL.iter().map(|category| (category.as_str(), 0)).collect();
        for (category, count) in &stats.by_category {
            by_category.insert(category.as_str(), *count);
        }

        Self {
            total: stats.total,
            pending: status_count(ComplaintStatus::Pending),
            in_progress: status_count(ComplaintStatus::InProgress),
            resolved: status_count(ComplaintStatus::Resolved),
            cancelled: status_count(ComplaintStatus::Cancelled),
            high_urgency: urgency_count(Urgency::High),
            low_urgency: urgency_count(Urgency::Low),
            by_category,
        }
    }
}
