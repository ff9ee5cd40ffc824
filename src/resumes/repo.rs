use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{ResumeFilter, UpdateResume};

/// Resume row: metadata over an on-disk PDF. `file_path` is the stored
/// relative path returned by the asset store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub language: String,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, file_name, file_path, language, is_public, created_at, updated_at";

pub async fn list(
    db: &PgPool,
    filter: &ResumeFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Resume>> {
    let rows = sqlx::query_as::<_, Resume>(&format!(
        "SELECT {COLUMNS} FROM resumes
         WHERE ($1::text IS NULL OR language = $1)
           AND ($2::bool IS NULL OR is_public = $2)
         ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(&filter.language)
    .bind(filter.is_public)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count(db: &PgPool, filter: &ResumeFilter) -> anyhow::Result<i64> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM resumes
         WHERE ($1::text IS NULL OR language = $1)
           AND ($2::bool IS NULL OR is_public = $2)",
    )
    .bind(&filter.language)
    .bind(filter.is_public)
    .fetch_one(db)
    .await?;
    Ok(total)
}

pub async fn list_public(db: &PgPool) -> anyhow::Result<Vec<Resume>> {
    let rows = sqlx::query_as::<_, Resume>(&format!(
        "SELECT {COLUMNS} FROM resumes WHERE is_public ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Resume>> {
    let row = sqlx::query_as::<_, Resume>(&format!("SELECT {COLUMNS} FROM resumes WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    file_name: &str,
    file_path: &str,
    language: &str,
    is_public: bool,
) -> anyhow::Result<Resume> {
    let row = sqlx::query_as::<_, Resume>(&format!(
        "INSERT INTO resumes (file_name, file_path, language, is_public)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(file_name)
    .bind(file_path)
    .bind(language)
    .bind(is_public)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: &UpdateResume,
    file_name: Option<&str>,
    file_path: Option<&str>,
) -> anyhow::Result<Option<Resume>> {
    let row = sqlx::query_as::<_, Resume>(&format!(
        "UPDATE resumes SET
             file_name = COALESCE($2, file_name),
             file_path = COALESCE($3, file_path),
             language = COALESCE($4, language),
             is_public = COALESCE($5, is_public),
             updated_at = now()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(file_name)
    .bind(file_path)
    .bind(&input.language)
    .bind(input.is_public)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
