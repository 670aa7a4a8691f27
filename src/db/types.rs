use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "complaintcategory", rename_all = "lowercase")]
pub(crate) enum Category {
    Electricity,
    Water,
    Maintenance,
    Cleanliness,
    Staff,
}

impl Category {
    pub(crate) const ALL: [Category; 5] = [
        Category::Electricity,
        Category::Water,
        Category::Maintenance,
        Category::Cleanliness,
        Category::Staff,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Water => "water",
            Self::Maintenance => "maintenance",
            Self::Cleanliness => "cleanliness",
            Self::Staff => "staff",
        }
    }

    /// Exact, case-insensitive match against the wire names.
    pub(crate) fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|category| category.as_str().eq_ignore_ascii_case(value))
    }
}

/// Only two levels exist; anything an upstream source calls "medium" is stored as `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "complainturgency", rename_all = "lowercase")]
pub(crate) enum Urgency {
    High,
    Low,
}

impl Urgency {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("high") {
            Some(Self::High)
        } else if value.eq_ignore_ascii_case("low") {
            Some(Self::Low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "complaintstatus", rename_all = "snake_case")]
pub(crate) enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
    Cancelled,
}

impl ComplaintStatus {
    pub(crate) const ACTIVE: [ComplaintStatus; 2] =
        [ComplaintStatus::Pending, ComplaintStatus::InProgress];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
        }
    }
}
