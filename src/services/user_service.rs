use crate::error::{Error, Result};
use crate::models::user::UserProfile;
use crate::services::identity_service::IdentityClaims;
use sqlx::PgPool;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

/// Whether `save_profile` created a row or found one already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    AlreadyExists,
}

impl SaveOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SaveOutcome::Created => "User data saved successfully",
            SaveOutcome::AlreadyExists => "User already exists",
        }
    }
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert-or-ignore keyed by the identity provider's subject.
    pub async fn save_profile(&self, claims: &IdentityClaims) -> Result<SaveOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (google_id, name, email, picture_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (google_id) DO NOTHING
            "#,
        )
        .bind(&claims.sub)
        .bind(&claims.name)
        .bind(&claims.email)
        .bind(&claims.picture)
        .execute(&self.pool)
        .await?;

        let outcome = if result.rows_affected() == 1 {
            SaveOutcome::Created
        } else {
            SaveOutcome::AlreadyExists
        };
        tracing::info!(google_id = %claims.sub, ?outcome, "Saved user profile");
        Ok(outcome)
    }

    pub async fn get_by_google_id(&self, google_id: &str) -> Result<UserProfile> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, google_id, name, email, picture_url, created_at
            FROM users
            WHERE google_id = $1
            "#,
        )
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }
}
