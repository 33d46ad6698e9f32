use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum UserRole {
    Teacher,
    Student,
    #[default]
    Unknown,
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "teacher" => UserRole::Teacher,
            "student" => UserRole::Student,
            _ => UserRole::Unknown,
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            UserRole::Teacher => write!(f, "teacher"),
            UserRole::Student => write!(f, "student"),
            UserRole::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Raw role as reported by the backend. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: String,
}

impl RoleResponse {
    pub fn user_role(&self) -> UserRole {
        UserRole::from(self.role.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Id,
    pub username: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_is_case_insensitive() {
        let role = RoleResponse {
            role: "Teacher".to_string(),
        };
        assert_eq!(role.user_role(), UserRole::Teacher);
        assert_eq!(UserRole::from("janitor".to_string()), UserRole::Unknown);
    }
}
