use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateSkill, UpdateSkill};

/// Skill row. `category` is constrained by the schema to the known set and
/// validated again at the DTO layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub light_image_url: Option<String>,
    pub dark_image_url: Option<String>,
    pub docs_link: Option<String>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, category, light_image_url, dark_image_url, docs_link, \
                       is_public, created_at, updated_at";

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Skill>> {
    let rows = sqlx::query_as::<_, Skill>(&format!(
        "SELECT {COLUMNS} FROM skills ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM skills")
        .fetch_one(db)
        .await?;
    Ok(total)
}

/// Whole public set, newest first (small collection, no pagination).
pub async fn list_public(db: &PgPool) -> anyhow::Result<Vec<Skill>> {
    let rows = sqlx::query_as::<_, Skill>(&format!(
        "SELECT {COLUMNS} FROM skills WHERE is_public ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Skill>> {
    let row = sqlx::query_as::<_, Skill>(&format!("SELECT {COLUMNS} FROM skills WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    input: &CreateSkill,
    light_image_url: Option<&str>,
    dark_image_url: Option<&str>,
) -> anyhow::Result<Skill> {
    let row = sqlx::query_as::<_, Skill>(&format!(
        "INSERT INTO skills (name, category, light_image_url, dark_image_url, docs_link, is_public)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(&input.name)
    .bind(&input.category)
    .bind(light_image_url)
    .bind(dark_image_url)
    .bind(&input.docs_link)
    .bind(input.is_public)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: &UpdateSkill,
    light_image_url: Option<&str>,
    dark_image_url: Option<&str>,
) -> anyhow::Result<Option<Skill>> {
    let row = sqlx::query_as::<_, Skill>(&format!(
        "UPDATE skills SET
             name = COALESCE($2, name),
             category = COALESCE($3, category),
             light_image_url = COALESCE($4, light_image_url),
             dark_image_url = COALESCE($5, dark_image_url),
             docs_link = COALESCE($6, docs_link),
             is_public = COALESCE($7, is_public),
             updated_at = now()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&input.name)
    .bind(&input.category)
    .bind(light_image_url)
    .bind(dark_image_url)
    .bind(&input.docs_link)
    .bind(input.is_public)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM skills WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
