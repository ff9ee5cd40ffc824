use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record. The stored refresh token is the single session slot: writing
/// a new one invalidates whatever was there before.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, refresh_token, created_at, updated_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, name)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Overwrite the session slot. Last write wins; concurrent logins racing
    /// here is accepted behavior.
    pub async fn set_refresh_token(db: &PgPool, id: Uuid, token: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn clear_refresh_token(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// A session is valid only while the presented refresh token matches the
    /// stored one; rotation makes stale tokens fail here.
    pub fn session_matches(&self, presented: &str) -> bool {
        self.refresh_token.as_deref() == Some(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_token(token: Option<&str>) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            email: "dev@example.com".into(),
            password_hash: "hash".into(),
            name: "Dev".into(),
            refresh_token: token.map(|t| t.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn session_matches_only_current_token() {
        let user = user_with_token(Some("current"));
        assert!(user.session_matches("current"));
        assert!(!user.session_matches("rotated-away"));
    }

    #[test]
    fn cleared_session_matches_nothing() {
        let user = user_with_token(None);
        assert!(!user.session_matches(""));
        assert!(!user.session_matches("anything"));
    }

    #[test]
    fn serialized_user_hides_secrets() {
        let user = user_with_token(Some("secret-token"));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret-token"));
        assert!(json.contains("dev@example.com"));
    }
}
