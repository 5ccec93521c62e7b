use crate::domain::{
    models::participation::{
        Confirmation, NewParticipation, ParticipantEntry, ParticipationRecord, ParticipationStatus,
    },
    ports::ParticipationRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub struct SqliteParticipationRepo {
    pool: SqlitePool,
}

impl SqliteParticipationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_duplicate(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Already joined".into())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl ParticipationRepository for SqliteParticipationRepo {
    async fn create(&self, record: &NewParticipation) -> Result<ParticipationRecord, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // SQLite has no row locks; issue a no-op write first so the
        // transaction holds the write lock before the capacity read.
        let locked = sqlx::query("UPDATE events SET status = status WHERE id = ?")
            .bind(record.event_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if locked.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }

        // Only confirmations count against the seats; PENDING rows queue
        // uncapped and get gated at approval time.
        if record.status == ParticipationStatus::Confirmed {
            let total_seats: Option<i64> = sqlx::query("SELECT total_seats FROM events WHERE id = ?")
                .bind(record.event_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(AppError::Database)?
                .get("total_seats");
            if let Some(seats) = total_seats {
                let confirmed = sqlx::query(
                    "SELECT COUNT(*) AS count FROM event_participants WHERE event_id = ? AND status = 'CONFIRMED'"
                )
                    .bind(record.event_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(AppError::Database)?
                    .get::<i64, _>("count");
                if confirmed >= seats {
                    return Err(AppError::SeatsFull);
                }
            }
        }

        let created = sqlx::query_as::<_, ParticipationRecord>(
            "INSERT INTO event_participants (event_id, participant_id, status, answers, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(record.event_id)
            .bind(record.participant_id)
            .bind(record.status.as_str())
            .bind(record.answers.clone().map(sqlx::types::Json))
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_duplicate)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find(&self, event_id: i64, participant_id: i64) -> Result<Option<ParticipationRecord>, AppError> {
        sqlx::query_as::<_, ParticipationRecord>(
            "SELECT * FROM event_participants WHERE event_id = ? AND participant_id = ?"
        )
            .bind(event_id)
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_confirmed(&self, event_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM event_participants WHERE event_id = ? AND status = 'CONFIRMED'"
        )
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn list_by_event(&self, event_id: i64) -> Result<Vec<ParticipantEntry>, AppError> {
        sqlx::query_as::<_, ParticipantEntry>(
            "SELECT ep.id, ep.event_id, ep.participant_id, ep.status, ep.answers, ep.created_at, pp.name AS participant_name, u.id AS user_id, u.email \
             FROM event_participants ep \
             JOIN participant_profiles pp ON pp.id = ep.participant_id \
             JOIN users u ON u.id = pp.user_id \
             WHERE ep.event_id = ? ORDER BY ep.created_at ASC, ep.id ASC"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn approve(&self, event_id: i64, record_id: i64) -> Result<(ParticipationRecord, Confirmation), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // SQLite has no row locks; issue a no-op write first so the
        // transaction holds the write lock before the capacity read.
        let locked = sqlx::query("UPDATE events SET status = status WHERE id = ?")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        if locked.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }

        let total_seats: Option<i64> = sqlx::query("SELECT total_seats FROM events WHERE id = ?")
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .get("total_seats");

        let record = sqlx::query_as::<_, ParticipationRecord>(
            "SELECT * FROM event_participants WHERE id = ? AND event_id = ?"
        )
            .bind(record_id)
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Participation record not found".into()))?;

        let status = ParticipationStatus::parse(&record.status)
            .ok_or_else(|| AppError::InternalWithMsg(format!("Corrupt participation status: {}", record.status)))?;

        if let Confirmation::AlreadyConfirmed = status.confirm() {
            return Ok((record, Confirmation::AlreadyConfirmed));
        }

        // PENDING rows were never capacity-gated, so the gate lives here.
        if let Some(seats) = total_seats {
            let confirmed = sqlx::query(
                "SELECT COUNT(*) AS count FROM event_participants WHERE event_id = ? AND status = 'CONFIRMED'"
            )
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(AppError::Database)?
                .get::<i64, _>("count");
            if confirmed >= seats {
                return Err(AppError::SeatsFull);
            }
        }

        let updated = sqlx::query_as::<_, ParticipationRecord>(
            "UPDATE event_participants SET status = 'CONFIRMED' WHERE id = ? RETURNING *"
        )
            .bind(record.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok((updated, Confirmation::NewlyConfirmed))
    }
}
