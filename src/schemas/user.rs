use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserCreate {
    #[validate(email(message = "Invalid email address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub(crate) name: String,
    #[serde(default)]
    #[serde(alias = "studentId")]
    #[validate(length(max = 64))]
    pub(crate) student_id: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub(crate) room: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "studentId")]
    #[validate(length(max = 64))]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub(crate) room: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) student_id: String,
    pub(crate) room: String,
    pub(crate) is_admin: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            student_id: user.student_id,
            room: user.room,
            is_admin: user.is_admin,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_create_accepts_camel_case_student_id() {
        let payload: UserCreate = serde_json::from_value(serde_json::json!({
            "email": "asha@hostel.local",
            "name": "Asha Rao",
            "studentId": "S-1042",
            "password": "longenough"
        }))
        .unwrap();

        assert_eq!(payload.student_id, "S-1042");
        assert_eq!(payload.room, "");
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn user_create_rejects_bad_email() {
        let payload: UserCreate = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
            "name": "Asha Rao",
            "password": "longenough"
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }
}
