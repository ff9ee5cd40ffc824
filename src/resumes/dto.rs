use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::forms::FormData;
use crate::validation::Validator;

use super::repo::Resume;

/// Languages a resume can be published in.
pub const RESUME_LANGUAGES: &[&str] = &["en", "ar", "fr", "es", "de", "it", "ja", "zh", "hi"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    pub id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub language: String,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Resume> for ResumeResponse {
    fn from(resume: Resume) -> Self {
        Self {
            id: resume.id,
            file_name: resume.file_name,
            file_path: resume.file_path,
            language: resume.language,
            is_public: resume.is_public,
            created_at: resume.created_at,
            updated_at: resume.updated_at,
        }
    }
}

/// Optional list filters, combined with the usual page parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFilter {
    pub language: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug)]
pub struct CreateResume {
    pub language: String,
    pub is_public: bool,
}

impl CreateResume {
    pub fn from_form(form: &FormData) -> Result<Self, Vec<FieldError>> {
        let language = form.text("language").unwrap_or("en");

        let mut v = Validator::new();
        v.one_of("language", Some(language), RESUME_LANGUAGES);
        let errors = v.finish();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            language: language.to_string(),
            is_public: form.bool_field("isPublic").unwrap_or(false),
        })
    }
}

#[derive(Debug, Default)]
pub struct UpdateResume {
    pub language: Option<String>,
    pub is_public: Option<bool>,
}

impl UpdateResume {
    pub fn from_form(form: &FormData) -> Result<Self, Vec<FieldError>> {
        let language = form.text("language");

        let mut v = Validator::new();
        v.one_of("language", language, RESUME_LANGUAGES);
        let errors = v.finish();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            language: language.map(str::to_string),
            is_public: form.bool_field("isPublic"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormData;

    #[test]
    fn create_defaults_to_english_and_private() {
        let input = CreateResume::from_form(&FormData::from_fields(&[])).unwrap();
        assert_eq!(input.language, "en");
        assert!(!input.is_public);
    }

    #[test]
    fn create_rejects_unknown_language() {
        let errors =
            CreateResume::from_form(&FormData::from_fields(&[("language", "xx")])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "language");
    }

    #[test]
    fn create_accepts_each_known_language() {
        for lang in RESUME_LANGUAGES.iter().copied() {
            let input =
                CreateResume::from_form(&FormData::from_fields(&[("language", lang)])).unwrap();
            assert_eq!(input.language, lang);
        }
    }

    #[test]
    fn update_leaves_omitted_fields_unset() {
        let input = UpdateResume::from_form(&FormData::from_fields(&[])).unwrap();
        assert!(input.language.is_none());
        assert!(input.is_public.is_none());
    }
}
