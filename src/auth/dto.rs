use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::validation::Validator;

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut v = Validator::new();
        v.require("email", Some(&self.email))
            .email("email", Some(&self.email))
            .require("password", Some(&self.password))
            .min_len("password", Some(&self.password), 8)
            .require("name", Some(&self.name))
            .max_len("name", Some(&self.name), 255);
        v.finish()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Optional body for refresh; the cookie is the primary transport.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<super::repo::User> for UserResponse {
    fn from(user: super::repo::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response returned after signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_requires_all_fields() {
        let req = SignupRequest {
            email: "".into(),
            password: "".into(),
            name: "".into(),
        };
        let errors = req.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"name"));
    }

    #[test]
    fn signup_rejects_short_password_and_bad_email() {
        let req = SignupRequest {
            email: "nope".into(),
            password: "short".into(),
            name: "Dev".into(),
        };
        let errors = req.validate();
        assert!(errors.iter().any(|e| e.field == "email"));
        assert!(errors.iter().any(|e| e.field == "password"));
    }

    #[test]
    fn valid_signup_passes() {
        let req = SignupRequest {
            email: "dev@example.com".into(),
            password: "correct-horse".into(),
            name: "Dev".into(),
        };
        assert!(req.validate().is_empty());
    }
}
