use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldError};

pub const MAX_LIMIT: i64 = 100;

/// Query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl Default for PageParams {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageParams {
    /// Out-of-range values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.page < 1 {
            errors.push(FieldError::new("page", "page must be at least 1"));
        }
        if self.limit < 1 || self.limit > MAX_LIMIT {
            errors.push(FieldError::new(
                "limit",
                format!("limit must be between 1 and {MAX_LIMIT}"),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, params: &PageParams) -> Self {
        Self {
            total,
            page: params.page,
            limit: params.limit,
            total_pages: (total + params.limit - 1) / params.limit,
        }
    }
}

/// List envelope: `{data, meta}`.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, params: &PageParams) -> Self {
        Self {
            data,
            meta: PageMeta::new(total, params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: i64, limit: i64) -> PageParams {
        PageParams { page, limit }
    }

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(PageMeta::new(0, &params(1, 10)).total_pages, 0);
        assert_eq!(PageMeta::new(1, &params(1, 10)).total_pages, 1);
        assert_eq!(PageMeta::new(10, &params(1, 10)).total_pages, 1);
        assert_eq!(PageMeta::new(11, &params(1, 10)).total_pages, 2);
        assert_eq!(PageMeta::new(101, &params(1, 25)).total_pages, 5);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(params(1, 10).offset(), 0);
        assert_eq!(params(3, 10).offset(), 20);
        assert_eq!(params(2, 25).offset(), 25);
    }

    #[test]
    fn defaults_are_page_one_limit_ten() {
        let p: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(params(0, 10).validate().is_err());
        assert!(params(1, 0).validate().is_err());
        assert!(params(1, 101).validate().is_err());
        assert!(params(1, 100).validate().is_ok());
        assert!(params(1, 1).validate().is_ok());
    }

    #[test]
    fn rejection_names_the_field() {
        let err = params(0, 200).validate().unwrap_err();
        match err {
            crate::error::ApiError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "page");
                assert_eq!(errors[1].field, "limit");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
