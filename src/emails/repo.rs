use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::CreateEmail;

/// Contact message. Append-only from the public facade.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Email {
    pub id: Uuid,
    pub email: String,
    pub message_type: String,
    pub subject: String,
    pub body: String,
    pub seen: bool,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, email, message_type, subject, body, seen, created_at";

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Email>> {
    let rows = sqlx::query_as::<_, Email>(&format!(
        "SELECT {COLUMNS} FROM emails ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM emails")
        .fetch_one(db)
        .await?;
    Ok(total)
}

pub async fn create(db: &PgPool, input: &CreateEmail) -> anyhow::Result<Email> {
    let row = sqlx::query_as::<_, Email>(&format!(
        "INSERT INTO emails (email, message_type, subject, body)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(&input.email)
    .bind(&input.message_type)
    .bind(&input.subject)
    .bind(&input.message)
    .fetch_one(db)
    .await?;
    Ok(row)
}
