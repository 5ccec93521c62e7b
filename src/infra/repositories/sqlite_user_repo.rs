use crate::domain::{
    models::user::{NewUser, OrganizerProfile, ParticipantProfile, Role, User},
    ports::UserRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn profile_name(user: &NewUser) -> String {
    user.name.clone().unwrap_or_else(|| {
        user.email.split('@').next().unwrap_or(&user.email).to_string()
    })
}

#[async_trait]
impl UserRepository for SqliteUserRepo {
    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, name, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn create_with_profile(&self, user: &NewUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, name, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let name = profile_name(user);
        match user.role {
            Role::Organizer => {
                sqlx::query("INSERT INTO organizer_profiles (user_id, name) VALUES (?, ?)")
                    .bind(created.id)
                    .bind(&name)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
            }
            Role::Participant => {
                sqlx::query("INSERT INTO participant_profiles (user_id, name) VALUES (?, ?)")
                    .bind(created.id)
                    .bind(&name)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
            }
            Role::Admin => {}
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("UPDATE users SET role = ? WHERE id = ? RETURNING *")
            .bind(role.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("User not found".into()))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn update_name(&self, id: i64, name: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn find_organizer_profile(&self, user_id: i64) -> Result<Option<OrganizerProfile>, AppError> {
        sqlx::query_as::<_, OrganizerProfile>("SELECT * FROM organizer_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_organizer_profile_by_id(&self, id: i64) -> Result<Option<OrganizerProfile>, AppError> {
        sqlx::query_as::<_, OrganizerProfile>("SELECT * FROM organizer_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_participant_profile(&self, user_id: i64) -> Result<Option<ParticipantProfile>, AppError> {
        sqlx::query_as::<_, ParticipantProfile>("SELECT * FROM participant_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn create_organizer_profile(&self, user_id: i64, name: &str) -> Result<OrganizerProfile, AppError> {
        sqlx::query_as::<_, OrganizerProfile>(
            "INSERT INTO organizer_profiles (user_id, name) VALUES (?, ?) RETURNING *"
        )
            .bind(user_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn create_participant_profile(&self, user_id: i64, name: &str) -> Result<ParticipantProfile, AppError> {
        sqlx::query_as::<_, ParticipantProfile>(
            "INSERT INTO participant_profiles (user_id, name) VALUES (?, ?) RETURNING *"
        )
            .bind(user_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn rename_organizer_profile(&self, user_id: i64, name: &str) -> Result<OrganizerProfile, AppError> {
        sqlx::query_as::<_, OrganizerProfile>(
            "UPDATE organizer_profiles SET name = ? WHERE user_id = ? RETURNING *"
        )
            .bind(name)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Organizer profile not found".into()))
    }

    async fn rename_participant_profile(&self, user_id: i64, name: &str) -> Result<ParticipantProfile, AppError> {
        sqlx::query_as::<_, ParticipantProfile>(
            "UPDATE participant_profiles SET name = ? WHERE user_id = ? RETURNING *"
        )
            .bind(name)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Participant profile not found".into()))
    }

    async fn find_user_by_participant(&self, participant_id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u JOIN participant_profiles pp ON pp.user_id = u.id WHERE pp.id = ?"
        )
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
