use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::ApiError;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];
pub const PDF_TYPES: &[&str] = &["application/pdf"];

const TMP_DIR: &str = "tmp";

/// Constraints enforced before an upload reaches the staging area.
#[derive(Debug, Clone, Copy)]
pub struct UploadRules {
    pub allowed_types: &'static [&'static str],
    pub max_bytes: usize,
}

impl UploadRules {
    pub const fn image() -> Self {
        Self {
            allowed_types: IMAGE_TYPES,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    pub const fn pdf() -> Self {
        Self {
            allowed_types: PDF_TYPES,
            max_bytes: MAX_PDF_BYTES,
        }
    }
}

/// Permanent directory an asset is committed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Projects,
    Skills,
    Resumes,
}

impl Category {
    pub fn dir(self) -> &'static str {
        match self {
            Category::Projects => "projects",
            Category::Skills => "skills",
            Category::Resumes => "resumes",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Category::Projects => "project",
            Category::Skills => "skill",
            Category::Resumes => "resume",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported file type: {0}")]
    InvalidType(String),

    #[error("file exceeds the {0}-byte limit")]
    TooLarge(usize),

    #[error("file not found")]
    NotFound,

    #[error("path escapes the upload root")]
    Traversal,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidType(t) => {
                ApiError::BadRequest(format!("unsupported file type: {t}"))
            }
            StoreError::TooLarge(limit) => {
                ApiError::BadRequest(format!("file exceeds the {limit}-byte limit"))
            }
            StoreError::NotFound => ApiError::NotFound("File"),
            StoreError::Traversal => ApiError::Forbidden,
            StoreError::Io(e) => ApiError::Storage(e.into()),
        }
    }
}

/// A staged upload awaiting `commit`. Consumed on commit so a temp file can
/// only be promoted once.
#[derive(Debug)]
pub struct Staged {
    temp_path: PathBuf,
    ext: &'static str,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Validate and write an upload into the staging area.
    async fn stage(
        &self,
        bytes: Bytes,
        content_type: &str,
        rules: &UploadRules,
    ) -> Result<Staged, StoreError>;

    /// Move a staged file into its permanent category directory and return
    /// the relative path callers store verbatim.
    async fn commit(&self, staged: Staged, category: Category) -> Result<String, StoreError>;

    /// Best-effort delete. Absence of the file is not an error; failures are
    /// logged, never propagated.
    async fn remove(&self, relative_path: &str);

    /// Read a stored file back, guarding against paths that escape the
    /// upload root. Returns the bytes and the content type for its extension.
    async fn open(&self, relative_path: &str) -> Result<(Vec<u8>, &'static str), StoreError>;
}

/// Local-disk store rooted at the configured upload directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a stored relative path (`/uploads/projects/x.jpg`) onto the root,
    /// rejecting anything that could point outside of it.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, StoreError> {
        let trimmed = relative_path
            .strip_prefix("/uploads/")
            .or_else(|| relative_path.strip_prefix("uploads/"))
            .unwrap_or(relative_path);

        if trimmed.is_empty()
            || trimmed.starts_with('/')
            || trimmed.contains('\\')
            || trimmed.contains('\0')
            || Path::new(trimmed)
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(StoreError::Traversal);
        }
        Ok(self.root.join(trimmed))
    }

    fn unique_name(prefix: &str, ext: &str) -> String {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        format!("{prefix}-{millis}-{}.{ext}", rand::random::<u32>())
    }
}

#[async_trait]
impl AssetStore for DiskStore {
    async fn stage(
        &self,
        bytes: Bytes,
        content_type: &str,
        rules: &UploadRules,
    ) -> Result<Staged, StoreError> {
        let Some(ext) = ext_for_mime(content_type) else {
            return Err(StoreError::InvalidType(content_type.to_string()));
        };
        if !rules.allowed_types.contains(&content_type) {
            return Err(StoreError::InvalidType(content_type.to_string()));
        }
        if bytes.len() > rules.max_bytes {
            return Err(StoreError::TooLarge(rules.max_bytes));
        }

        let tmp_dir = self.root.join(TMP_DIR);
        tokio::fs::create_dir_all(&tmp_dir).await?;
        let temp_path = tmp_dir.join(Self::unique_name("stage", ext));
        tokio::fs::write(&temp_path, &bytes).await?;
        debug!(path = %temp_path.display(), size = bytes.len(), "upload staged");
        Ok(Staged { temp_path, ext })
    }

    async fn commit(&self, staged: Staged, category: Category) -> Result<String, StoreError> {
        let dir = self.root.join(category.dir());
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = Self::unique_name(category.prefix(), staged.ext);
        let dest = dir.join(&file_name);
        tokio::fs::rename(&staged.temp_path, &dest).await?;
        debug!(path = %dest.display(), "upload committed");
        Ok(format!("/uploads/{}/{}", category.dir(), file_name))
    }

    async fn remove(&self, relative_path: &str) {
        let path = match self.resolve(relative_path) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = relative_path, error = %e, "refusing to remove asset");
                return;
            }
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "asset removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove asset"),
        }
    }

    async fn open(&self, relative_path: &str) -> Result<(Vec<u8>, &'static str), StoreError> {
        let candidate = self.resolve(relative_path)?;

        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|_| StoreError::NotFound)?;
        let resolved = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(|_| StoreError::NotFound)?;
        if !resolved.starts_with(&root) {
            return Err(StoreError::Traversal);
        }

        let bytes = tokio::fs::read(&resolved).await?;
        let ext = resolved
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Ok((bytes, content_type_for_ext(ext)))
    }
}

pub fn ext_for_mime(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

pub fn content_type_for_ext(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn image_bytes() -> Bytes {
        Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4])
    }

    #[tokio::test]
    async fn stage_rejects_disallowed_type() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let err = store
            .stage(image_bytes(), "application/zip", &UploadRules::image())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidType(_)));
        // nothing staged
        assert!(!dir.path().join(TMP_DIR).exists());
    }

    #[tokio::test]
    async fn stage_rejects_pdf_for_image_rules() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let err = store
            .stage(image_bytes(), "application/pdf", &UploadRules::image())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidType(_)));
    }

    #[tokio::test]
    async fn stage_rejects_oversize_file() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let huge = Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]);
        let err = store
            .stage(huge, "image/jpeg", &UploadRules::image())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TooLarge(_)));
        assert!(!dir.path().join(TMP_DIR).exists());
    }

    #[tokio::test]
    async fn commit_moves_out_of_staging_and_returns_relative_path() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let staged = store
            .stage(image_bytes(), "image/jpeg", &UploadRules::image())
            .await
            .unwrap();
        let temp_path = staged.temp_path.clone();

        let rel = store.commit(staged, Category::Projects).await.unwrap();
        assert!(rel.starts_with("/uploads/projects/project-"));
        assert!(rel.ends_with(".jpg"));
        assert!(!temp_path.exists());

        let (bytes, content_type) = store.open(&rel).await.unwrap();
        assert_eq!(bytes, image_bytes().to_vec());
        assert_eq!(content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn open_rejects_traversal() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path().join("uploads"));
        tokio::fs::create_dir_all(dir.path().join("uploads")).await.unwrap();
        tokio::fs::write(dir.path().join("secret.txt"), b"top secret")
            .await
            .unwrap();

        for path in [
            "../secret.txt",
            "/uploads/../secret.txt",
            "projects/../../secret.txt",
            "/etc/passwd",
        ] {
            let err = store.open(path).await.unwrap_err();
            assert!(
                matches!(err, StoreError::Traversal | StoreError::NotFound),
                "{path} should not be served, got {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn open_unknown_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let err = store.open("/uploads/projects/nope.jpg").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let staged = store
            .stage(image_bytes(), "image/png", &UploadRules::image())
            .await
            .unwrap();
        let rel = store.commit(staged, Category::Skills).await.unwrap();

        store.remove(&rel).await;
        assert!(store.open(&rel).await.is_err());
        // second removal and unknown paths are no-ops
        store.remove(&rel).await;
        store.remove("/uploads/projects/never-existed.jpg").await;
        store.remove("../outside.txt").await;
    }

    #[test]
    fn mime_mapping_round_trip() {
        assert_eq!(ext_for_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_for_mime("application/pdf"), Some("pdf"));
        assert_eq!(ext_for_mime("text/html"), None);
        assert_eq!(content_type_for_ext("jpeg"), "image/jpeg");
        assert_eq!(content_type_for_ext("pdf"), "application/pdf");
        assert_eq!(content_type_for_ext("exe"), "application/octet-stream");
    }
}
