use crate::domain::{
    models::participation::{
        Confirmation, NewParticipation, ParticipantEntry, ParticipationRecord, ParticipationStatus,
    },
    ports::ParticipationRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

pub struct PostgresParticipationRepo {
    pool: PgPool,
}

impl PostgresParticipationRepo {
    pub fn new(pool: PgPool) -> Self {
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
impl ParticipationRepository for PostgresParticipationRepo {
    async fn create(&self, record: &NewParticipation) -> Result<ParticipationRecord, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock on the event serialises concurrent joins against the
        // capacity read below.
        let event_row = sqlx::query("SELECT total_seats FROM events WHERE id = $1 FOR UPDATE")
            .bind(record.event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Event not found".into()))?;

        // Only confirmations count against the seats; PENDING rows queue
        // uncapped and get gated at approval time.
        if record.status == ParticipationStatus::Confirmed {
            let total_seats: Option<i64> = event_row.get("total_seats");
            if let Some(seats) = total_seats {
                let confirmed = sqlx::query(
                    "SELECT COUNT(*) AS count FROM event_participants WHERE event_id = $1 AND status = 'CONFIRMED'"
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
            "INSERT INTO event_participants (event_id, participant_id, status, answers, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *"
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
            "SELECT * FROM event_participants WHERE event_id = $1 AND participant_id = $2"
        )
            .bind(event_id)
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_confirmed(&self, event_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM event_participants WHERE event_id = $1 AND status = 'CONFIRMED'"
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
             WHERE ep.event_id = $1 ORDER BY ep.created_at ASC, ep.id ASC"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn approve(&self, event_id: i64, record_id: i64) -> Result<(ParticipationRecord, Confirmation), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock on the event serialises concurrent approvals against the
        // capacity read below.
        let event_row = sqlx::query("SELECT total_seats FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Event not found".into()))?;
        let total_seats: Option<i64> = event_row.get("total_seats");

        let record = sqlx::query_as::<_, ParticipationRecord>(
            "SELECT * FROM event_participants WHERE id = $1 AND event_id = $2"
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
                "SELECT COUNT(*) AS count FROM event_participants WHERE event_id = $1 AND status = 'CONFIRMED'"
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
            "UPDATE event_participants SET status = 'CONFIRMED' WHERE id = $1 RETURNING *"
        )
            .bind(record.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok((updated, Confirmation::NewlyConfirmed))
    }
}
