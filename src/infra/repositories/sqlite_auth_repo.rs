use crate::domain::{
    models::{
        credential::{OtpCode, PasswordResetToken, UnverifiedUser},
        user::{Role, User},
    },
    ports::AuthRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteAuthRepo {
    pool: SqlitePool,
}

impl SqliteAuthRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthRepository for SqliteAuthRepo {
    async fn replace_unverified(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM unverified_users WHERE email = ?")
            .bind(email)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        sqlx::query(
            "INSERT INTO unverified_users (email, name, password_hash, role, token, expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .bind(role.as_str())
            .bind(token)
            .bind(expires_at)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_unverified_by_token(&self, token: &str) -> Result<Option<UnverifiedUser>, AppError> {
        sqlx::query_as::<_, UnverifiedUser>("SELECT * FROM unverified_users WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn promote_unverified(&self, pending: &UnverifiedUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, name, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&pending.email)
            .bind(&pending.name)
            .bind(&pending.password_hash)
            .bind(&pending.role)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        match Role::parse(&pending.role) {
            Some(Role::Organizer) => {
                sqlx::query("INSERT INTO organizer_profiles (user_id, name) VALUES (?, ?)")
                    .bind(user.id)
                    .bind(&pending.name)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
            }
            Some(Role::Participant) => {
                sqlx::query("INSERT INTO participant_profiles (user_id, name) VALUES (?, ?)")
                    .bind(user.id)
                    .bind(&pending.name)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
            }
            _ => {}
        }

        sqlx::query("DELETE FROM unverified_users WHERE id = ?")
            .bind(pending.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(user)
    }

    async fn replace_otp(
        &self,
        email: &str,
        code: &str,
        purpose: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM otp_codes WHERE email = ? AND purpose = ?")
            .bind(email)
            .bind(purpose)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        sqlx::query(
            "INSERT INTO otp_codes (email, code, purpose, expires_at, created_at) VALUES (?, ?, ?, ?, ?)"
        )
            .bind(email)
            .bind(code)
            .bind(purpose)
            .bind(expires_at)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_valid_otp(&self, email: &str, code: &str) -> Result<Option<OtpCode>, AppError> {
        sqlx::query_as::<_, OtpCode>(
            "SELECT * FROM otp_codes WHERE email = ? AND code = ? AND consumed_at IS NULL AND expires_at > ?"
        )
            .bind(email)
            .bind(code)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn consume_otp(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE otp_codes SET consumed_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn create_reset_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?)"
        )
            .bind(user_id)
            .bind(token_hash)
            .bind(expires_at)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_valid_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>, AppError> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = ? AND used_at IS NULL AND expires_at > ?"
        )
            .bind(token_hash)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn reset_password(&self, token_id: i64, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        sqlx::query("UPDATE password_reset_tokens SET used_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(token_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}
