use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::ApiError;

/// A file part received in a multipart request, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Text fields and file parts of a multipart form, keyed by part name.
///
/// Repeated text parts (e.g. several `skills` entries) are kept in order;
/// a repeated file part keeps the last occurrence.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn from_multipart(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid multipart data: {e}")))?
        {
            let Some(name) = field.name().map(|s| s.to_string()) else {
                continue;
            };
            if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file part: {e}")))?;
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read field: {e}")))?;
                form.fields.entry(name).or_default().push(value);
            }
        }
        Ok(form)
    }

    /// First value of a text field, if present.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn text_owned(&self, name: &str) -> Option<String> {
        self.text(name).map(|s| s.to_string())
    }

    /// All values of a repeated text field. Single comma-separated values are
    /// split, so both `skills=a&skills=b` and `skills=a,b` submissions work.
    pub fn texts(&self, name: &str) -> Vec<String> {
        let Some(values) = self.fields.get(name) else {
            return Vec::new();
        };
        values
            .iter()
            .flat_map(|v| v.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Boolean field sent as the strings "true"/"false".
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.text(name).map(|v| v == "true")
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    /// Build form data directly from text fields, bypassing multipart.
    #[cfg(test)]
    pub fn from_fields(fields: &[(&str, &str)]) -> Self {
        let mut form = FormData::default();
        for (name, value) in fields {
            form.fields
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with(fields: &[(&str, &str)]) -> FormData {
        FormData::from_fields(fields)
    }

    #[test]
    fn text_returns_first_value() {
        let form = form_with(&[("name", "Foo"), ("name", "Bar")]);
        assert_eq!(form.text("name"), Some("Foo"));
        assert_eq!(form.text("missing"), None);
    }

    #[test]
    fn texts_splits_comma_separated_values() {
        let form = form_with(&[("skills", "a, b"), ("skills", "c")]);
        assert_eq!(form.texts("skills"), vec!["a", "b", "c"]);
        assert!(form.texts("missing").is_empty());
    }

    #[test]
    fn bool_field_only_accepts_true() {
        let form = form_with(&[("isPublic", "true"), ("other", "yes")]);
        assert_eq!(form.bool_field("isPublic"), Some(true));
        assert_eq!(form.bool_field("other"), Some(false));
        assert_eq!(form.bool_field("missing"), None);
    }
}
