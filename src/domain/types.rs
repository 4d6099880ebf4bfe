//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Reader,
    Author,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Reader => "reader",
            UserRole::Author => "author",
            UserRole::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for UserRole {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "reader" => Ok(UserRole::Reader),
            "author" => Ok(UserRole::Author),
            "admin" => Ok(UserRole::Admin),
            _ => Err(()),
        }
    }
}
