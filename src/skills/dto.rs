use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::forms::FormData;
use crate::validation::Validator;

use super::repo::Skill;

/// Allowed skill categories, as stored and as sent over the wire.
pub const SKILL_CATEGORIES: &[&str] = &["backend", "frontend", "database", "other"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub light_image_url: Option<String>,
    pub dark_image_url: Option<String>,
    pub docs_link: Option<String>,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Skill> for SkillResponse {
    fn from(skill: Skill) -> Self {
        Self {
            id: skill.id,
            name: skill.name,
            category: skill.category,
            light_image_url: skill.light_image_url,
            dark_image_url: skill.dark_image_url,
            docs_link: skill.docs_link,
            is_public: skill.is_public,
            created_at: skill.created_at,
            updated_at: skill.updated_at,
        }
    }
}

#[derive(Debug)]
pub struct CreateSkill {
    pub name: String,
    pub category: String,
    pub docs_link: Option<String>,
    pub is_public: bool,
}

impl CreateSkill {
    pub fn from_form(form: &FormData) -> Result<Self, Vec<FieldError>> {
        let name = form.text("name");
        let category = form.text("category");
        let docs_link = form.text("docsLink");

        let mut v = Validator::new();
        v.require("name", name)
            .max_len("name", name, 255)
            .require("category", category)
            .one_of("category", category, SKILL_CATEGORIES)
            .url("docsLink", docs_link);
        let errors = v.finish();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name: name.unwrap_or_default().trim().to_string(),
            category: category.unwrap_or_default().to_string(),
            docs_link: docs_link.map(str::to_string),
            is_public: form.bool_field("isPublic").unwrap_or(false),
        })
    }
}

#[derive(Debug, Default)]
pub struct UpdateSkill {
    pub name: Option<String>,
    pub category: Option<String>,
    pub docs_link: Option<String>,
    pub is_public: Option<bool>,
}

impl UpdateSkill {
    pub fn from_form(form: &FormData) -> Result<Self, Vec<FieldError>> {
        let name = form.text("name");
        let category = form.text("category");
        let docs_link = form.text("docsLink");

        let mut v = Validator::new();
        v.min_len("name", name, 1)
            .max_len("name", name, 255)
            .one_of("category", category, SKILL_CATEGORIES)
            .url("docsLink", docs_link);
        let errors = v.finish();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name: name.map(str::to_string),
            category: category.map(str::to_string),
            docs_link: docs_link.map(str::to_string),
            is_public: form.bool_field("isPublic"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormData;

    #[test]
    fn create_requires_name_and_category() {
        let errors = CreateSkill::from_form(&FormData::from_fields(&[])).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"category"));
    }

    #[test]
    fn create_rejects_unknown_category() {
        let errors = CreateSkill::from_form(&FormData::from_fields(&[
            ("name", "Rust"),
            ("category", "fullstack"),
        ]))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "category");
    }

    #[test]
    fn create_accepts_each_known_category() {
        for category in SKILL_CATEGORIES.iter().copied() {
            let input = CreateSkill::from_form(&FormData::from_fields(&[
                ("name", "Rust"),
                ("category", category),
            ]))
            .unwrap();
            assert_eq!(input.category, category);
        }
    }

    #[test]
    fn update_with_no_fields_is_a_noop() {
        let input = UpdateSkill::from_form(&FormData::from_fields(&[])).unwrap();
        assert!(input.name.is_none());
        assert!(input.category.is_none());
        assert!(input.docs_link.is_none());
        assert!(input.is_public.is_none());
    }
}
