use time::PrimitiveDateTime;

use crate::db::types::{Category, ComplaintStatus, Urgency};

pub(crate) const COLUMNS: &str = "\
    id, user_id, user_name, user_room, category, urgency, title, description, location, \
    status, admin_notes, image_data, ai_analysis_text, created_at, updated_at";

pub(crate) struct CreateComplaint<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) user_name: &'a str,
    pub(crate) user_room: &'a str,
    pub(crate) category: Category,
    pub(crate) urgency: Urgency,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) location: &'a str,
    pub(crate) status: ComplaintStatus,
    pub(crate) image_data: Option<&'a str>,
    pub(crate) ai_analysis_text: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Shared by the student history and the admin list. `user_id` scopes the
/// query to one owner; `active` keeps only `pending` and `in_progress`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ComplaintFilter {
    pub(crate) user_id: Option<String>,
    pub(crate) status: Option<ComplaintStatus>,
    pub(crate) urgency: Option<Urgency>,
    pub(crate) category: Option<Category>,
    pub(crate) active: bool,
    pub(crate) search: Option<String>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

#[derive(Debug, Default)]
pub(crate) struct ComplaintStats {
    pub(crate) total: i64,
    pub(crate) by_status: Vec<(ComplaintStatus, i64)>,
    pub(crate) by_urgency: Vec<(Urgency, i64)>,
    pub(crate) by_category: Vec<(Category, i64)>,
}
