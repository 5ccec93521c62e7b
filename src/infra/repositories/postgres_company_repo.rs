use crate::domain::{
    models::{
        company::{Company, NewCompany},
        user::OrganizerProfile,
    },
    ports::CompanyRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresCompanyRepo {
    pool: PgPool,
}

impl PostgresCompanyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepo {
    async fn create(&self, company: &NewCompany) -> Result<Company, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (name, description, owner_id, created_at) VALUES ($1, $2, $3, $4) RETURNING *"
        )
            .bind(&company.name)
            .bind(&company.description)
            .bind(company.owner_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("UPDATE organizer_profiles SET company_id = $1 WHERE id = $2")
            .bind(created.id)
            .bind(company.owner_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Company>, AppError> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Company>, AppError> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, id: i64, name: Option<&str>, description: Option<&str>) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            "UPDATE companies SET name = COALESCE($1, name), description = COALESCE($2, description) WHERE id = $3 RETURNING *"
        )
            .bind(name)
            .bind(description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Company not found".into()))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("UPDATE organizer_profiles SET company_id = NULL WHERE company_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Company not found".into()));
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn add_organizer(&self, company_id: i64, organizer_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE organizer_profiles SET company_id = $1 WHERE id = $2")
            .bind(company_id)
            .bind(organizer_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Organizer profile not found".into()));
        }
        Ok(())
    }

    async fn list_organizers(&self, company_id: i64) -> Result<Vec<OrganizerProfile>, AppError> {
        sqlx::query_as::<_, OrganizerProfile>(
            "SELECT * FROM organizer_profiles WHERE company_id = $1 ORDER BY id ASC"
        )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
