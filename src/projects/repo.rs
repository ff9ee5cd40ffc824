use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateProject, UpdateProject};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub website_link: Option<String>,
    pub github_link: Option<String>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, description, website_link, github_link, image_url, is_public, \
                       created_at, updated_at";

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, Project>(&format!(
        "SELECT {COLUMNS} FROM projects ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
        .fetch_one(db)
        .await?;
    Ok(total)
}

pub async fn list_public(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, Project>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE is_public ORDER BY created_at DESC \
         LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_public(db: &PgPool) -> anyhow::Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE is_public")
        .fetch_one(db)
        .await?;
    Ok(total)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Project>> {
    let row = sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    input: &CreateProject,
    image_url: Option<&str>,
) -> anyhow::Result<Project> {
    let row = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (name, description, website_link, github_link, image_url, is_public)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.website_link)
    .bind(&input.github_link)
    .bind(image_url)
    .bind(input.is_public)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Partial update: NULL binds fall through to the stored value.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: &UpdateProject,
    image_url: Option<&str>,
) -> anyhow::Result<Option<Project>> {
    let row = sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects SET
             name = COALESCE($2, name),
             description = COALESCE($3, description),
             website_link = COALESCE($4, website_link),
             github_link = COALESCE($5, github_link),
             image_url = COALESCE($6, image_url),
             is_public = COALESCE($7, is_public),
             updated_at = now()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.website_link)
    .bind(&input.github_link)
    .bind(image_url)
    .bind(input.is_public)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Keep only ids that exist in `skills`; unknown ids are dropped, never an
/// error.
pub async fn resolve_skill_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Uuid>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM skills WHERE id = ANY($1)")
        .bind(ids.to_vec())
        .fetch_all(db)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Replace the skill association wholesale.
pub async fn replace_skills(db: &PgPool, project_id: Uuid, ids: &[Uuid]) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM project_skills WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    for skill_id in ids {
        sqlx::query(
            "INSERT INTO project_skills (project_id, skill_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(skill_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn skill_ids_of(db: &PgPool, project_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT skill_id FROM project_skills WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(db)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Association pairs for a page of projects, fetched in one round trip.
pub async fn skill_ids_for(
    db: &PgPool,
    project_ids: &[Uuid],
) -> anyhow::Result<Vec<(Uuid, Uuid)>> {
    if project_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "SELECT project_id, skill_id FROM project_skills WHERE project_id = ANY($1)",
    )
    .bind(project_ids.to_vec())
    .fetch_all(db)
    .await?;
    Ok(rows)
}
