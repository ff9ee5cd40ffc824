use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Absolute http(s) URL with a host component.
pub(crate) fn is_valid_url(url: &str) -> bool {
    lazy_static! {
        static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
    }
    URL_RE.is_match(url)
}

/// Collects `FieldError`s while a write DTO is checked, so a response can
/// report every violation at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            _ => self
                .errors
                .push(FieldError::new(field, format!("{field} is required"))),
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.errors.push(FieldError::new(
                    field,
                    format!("{field} must be at most {max} characters"),
                ));
            }
        }
        self
    }

    pub fn min_len(&mut self, field: &str, value: Option<&str>, min: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() < min {
                self.errors.push(FieldError::new(
                    field,
                    format!("{field} must be at least {min} characters"),
                ));
            }
        }
        self
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if !is_valid_email(v) {
                self.errors
                    .push(FieldError::new(field, format!("{field} must be a valid email")));
            }
        }
        self
    }

    pub fn url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if !is_valid_url(v) {
                self.errors.push(FieldError::new(
                    field,
                    format!("{field} must be a valid http(s) URL"),
                ));
            }
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) -> &mut Self {
        if let Some(v) = value {
            if !allowed.contains(&v) {
                self.errors.push(FieldError::new(
                    field,
                    format!("{field} must be one of: {}", allowed.join(", ")),
                ));
            }
        }
        self
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("dev@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@mail.com"));
    }

    #[test]
    fn url_requires_scheme_and_host() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://example.com/path?q=1#frag"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("https://bad url.com"));
    }

    #[test]
    fn require_flags_missing_and_blank() {
        let mut v = Validator::new();
        v.require("name", None).require("description", Some("  "));
        let errors = v.finish();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "description");
    }

    #[test]
    fn optional_checks_skip_absent_values() {
        let mut v = Validator::new();
        v.url("websiteLink", None)
            .email("email", None)
            .one_of("category", None, &["backend"]);
        assert!(v.finish().is_empty());
    }

    #[test]
    fn one_of_rejects_unknown_variant() {
        let mut v = Validator::new();
        v.one_of("category", Some("fullstack"), &["backend", "frontend"]);
        let errors = v.finish();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "category");
    }
}
