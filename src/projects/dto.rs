use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FieldError;
use crate::forms::FormData;
use crate::validation::Validator;

use super::repo::Project;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website_link: Option<String>,
    pub github_link: Option<String>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub skills: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProjectResponse {
    pub fn from_parts(project: Project, skills: Vec<Uuid>) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            website_link: project.website_link,
            github_link: project.github_link,
            image_url: project.image_url,
            is_public: project.is_public,
            skills,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Text parts of a project create form. The `image` file part is handled by
/// the asset store, `skills` entries that are not well-formed UUIDs are
/// dropped silently (unknown ids are dropped later, at resolution).
#[derive(Debug)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub website_link: Option<String>,
    pub github_link: Option<String>,
    pub is_public: bool,
    pub skills: Vec<Uuid>,
}

impl CreateProject {
    pub fn from_form(form: &FormData) -> Result<Self, Vec<FieldError>> {
        let name = form.text("name");
        let description = form.text("description");
        let website_link = form.text("websiteLink");
        let github_link = form.text("githubLink");

        let mut v = Validator::new();
        v.require("name", name)
            .max_len("name", name, 255)
            .require("description", description)
            .url("websiteLink", website_link)
            .url("githubLink", github_link);
        let errors = v.finish();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name: name.unwrap_or_default().trim().to_string(),
            description: description.unwrap_or_default().trim().to_string(),
            website_link: website_link.map(str::to_string),
            github_link: github_link.map(str::to_string),
            is_public: form.bool_field("isPublic").unwrap_or(false),
            skills: parse_skill_ids(form),
        })
    }
}

/// Partial update: a missing part leaves the stored value unchanged.
#[derive(Debug, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website_link: Option<String>,
    pub github_link: Option<String>,
    pub is_public: Option<bool>,
    pub skills: Vec<Uuid>,
}

impl UpdateProject {
    pub fn from_form(form: &FormData) -> Result<Self, Vec<FieldError>> {
        let name = form.text("name");
        let website_link = form.text("websiteLink");
        let github_link = form.text("githubLink");

        let mut v = Validator::new();
        v.min_len("name", name, 1)
            .max_len("name", name, 255)
            .url("websiteLink", website_link)
            .url("githubLink", github_link);
        let errors = v.finish();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name: name.map(str::to_string),
            description: form.text_owned("description"),
            website_link: website_link.map(str::to_string),
            github_link: github_link.map(str::to_string),
            is_public: form.bool_field("isPublic"),
            skills: parse_skill_ids(form),
        })
    }
}

fn parse_skill_ids(form: &FormData) -> Vec<Uuid> {
    form.texts("skills")
        .iter()
        .filter_map(|s| Uuid::parse_str(s).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormData;

    fn form(fields: &[(&str, &str)]) -> FormData {
        FormData::from_fields(fields)
    }

    #[test]
    fn create_without_description_names_the_field() {
        let errors = CreateProject::from_form(&form(&[("name", "Foo")])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "description");
    }

    #[test]
    fn create_rejects_malformed_links() {
        let errors = CreateProject::from_form(&form(&[
            ("name", "Foo"),
            ("description", "d"),
            ("websiteLink", "not-a-url"),
        ]))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "websiteLink");
    }

    #[test]
    fn create_parses_flags_and_skills() {
        let id = Uuid::new_v4();
        let input = CreateProject::from_form(&form(&[
            ("name", "Foo"),
            ("description", "d"),
            ("websiteLink", "https://x.com"),
            ("githubLink", "https://y.com"),
            ("isPublic", "true"),
            ("skills", &format!("{id},garbage")),
        ]))
        .unwrap();
        assert!(input.is_public);
        assert_eq!(input.skills, vec![id]);
        assert_eq!(input.website_link.as_deref(), Some("https://x.com"));
    }

    #[test]
    fn create_defaults_is_public_to_false() {
        let input =
            CreateProject::from_form(&form(&[("name", "Foo"), ("description", "d")])).unwrap();
        assert!(!input.is_public);
    }

    #[test]
    fn update_keeps_omitted_fields_unset() {
        let input = UpdateProject::from_form(&form(&[("name", "Renamed")])).unwrap();
        assert_eq!(input.name.as_deref(), Some("Renamed"));
        assert!(input.description.is_none());
        assert!(input.is_public.is_none());
        assert!(input.skills.is_empty());
    }

    #[test]
    fn update_rejects_blank_name() {
        let errors = UpdateProject::from_form(&form(&[("name", "")])).unwrap_err();
        assert_eq!(errors[0].field, "name");
    }
}
