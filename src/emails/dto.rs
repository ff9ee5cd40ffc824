use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::validation::Validator;

use super::repo::Email;

/// Contact-form submission from the public site. `type` and `message` are the
/// wire names; internally they are the message type and body.
#[derive(Debug, Deserialize)]
pub struct CreateEmail {
    pub email: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub subject: String,
    pub message: String,
}

impl CreateEmail {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut v = Validator::new();
        v.require("email", Some(&self.email))
            .email("email", Some(&self.email))
            .require("type", Some(&self.message_type))
            .require("subject", Some(&self.subject))
            .max_len("subject", Some(&self.subject), 255)
            .require("message", Some(&self.message));
        v.finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailResponse {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub subject: String,
    pub message: String,
    pub seen: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Email> for EmailResponse {
    fn from(email: Email) -> Self {
        Self {
            id: email.id,
            email: email.email,
            message_type: email.message_type,
            subject: email.subject,
            message: email.body,
            seen: email.seen,
            created_at: email.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CreateEmail {
        CreateEmail {
            email: "visitor@example.com".into(),
            message_type: "job-offer".into(),
            subject: "Hello".into(),
            message: "I have a proposal.".into(),
        }
    }

    #[test]
    fn valid_submission_passes() {
        assert!(valid().validate().is_empty());
    }

    #[test]
    fn rejects_bad_sender_address() {
        let mut input = valid();
        input.email = "not-an-address".into();
        let errors = input.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn rejects_blank_body() {
        let mut input = valid();
        input.message = "   ".into();
        let errors = input.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "message");
    }

    #[test]
    fn response_uses_wire_names() {
        let email = Email {
            id: Uuid::new_v4(),
            email: "visitor@example.com".into(),
            message_type: "question".into(),
            subject: "Hi".into(),
            body: "What about...".into(),
            seen: false,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(EmailResponse::from(email)).unwrap();
        assert_eq!(json["type"], "question");
        assert_eq!(json["message"], "What about...");
        assert!(json.get("body").is_none());
        assert!(json.get("messageType").is_none());
    }
}
