use crate::domain::{
    models::event::{
        Attachment, Event, EventFilter, EventStatus, EventWithCount, NewAttachment, NewEvent,
        StatusFilter,
    },
    ports::EventRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const CONFIRMED_COUNT_SELECT: &str = "SELECT e.*, (SELECT COUNT(*) FROM event_participants p WHERE p.event_id = e.id AND p.status = 'CONFIRMED') AS confirmed_participants, op.name AS organizer_name, c.name AS company_name FROM events e JOIN organizer_profiles op ON op.id = e.organizer_id JOIN companies c ON c.id = e.company_id";

// A user searching for a literal '%' or '_' must not get a wildcard.
fn escape_like(term: &str) -> String {
    term.to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn status_clause(filter: &StatusFilter) -> String {
    match filter {
        StatusFilter::All => "e.status IN ('ACTIVE', 'COMPLETED', 'CANCELLED')".to_string(),
        StatusFilter::Single(s) => format!("e.status = '{}'", s.as_str()),
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &NewEvent, attachments: &[NewAttachment]) -> Result<Event, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, Event>(
            "INSERT INTO events (title, description, mode, category, venue, join_link, contact_info, total_seats, requires_approval, join_questions, start_date, end_date, status, organizer_id, company_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.mode.as_str())
            .bind(&event.category)
            .bind(&event.venue)
            .bind(&event.join_link)
            .bind(&event.contact_info)
            .bind(event.total_seats)
            .bind(event.requires_approval)
            .bind(event.join_questions.clone().map(sqlx::types::Json))
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(EventStatus::Active.as_str())
            .bind(event.organizer_id)
            .bind(event.company_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for att in attachments {
            sqlx::query("INSERT INTO attachments (event_id, url, public_id, media_type) VALUES (?, ?, ?, ?)")
                .bind(created.id)
                .bind(&att.url)
                .bind(&att.public_id)
                .bind(&att.media_type)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<EventWithCount>, AppError> {
        sqlx::query_as::<_, EventWithCount>(&format!("{} WHERE e.id = ?", CONFIRMED_COUNT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, filter: &EventFilter) -> Result<(Vec<EventWithCount>, i64), AppError> {
        let status_sql = status_clause(&filter.status);
        let search_sql = if filter.search.is_some() {
            " AND (LOWER(e.title) LIKE ? ESCAPE '\\' OR LOWER(e.description) LIKE ? ESCAPE '\\')"
        } else {
            ""
        };
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", escape_like(s)));

        let count_sql = format!("SELECT COUNT(*) AS count FROM events e WHERE {}{}", status_sql, search_sql);
        let mut count_query = sqlx::query(&count_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p.clone()).bind(p.clone());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?
            .get::<i64, _>("count");

        let list_sql = format!(
            "{} WHERE {}{} ORDER BY e.start_date ASC LIMIT ? OFFSET ?",
            CONFIRMED_COUNT_SELECT, status_sql, search_sql
        );
        let mut list_query = sqlx::query_as::<_, EventWithCount>(&list_sql);
        if let Some(p) = &pattern {
            list_query = list_query.bind(p.clone()).bind(p.clone());
        }
        let items = list_query
            .bind(filter.page_size)
            .bind((filter.page - 1) * filter.page_size)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((items, total))
    }

    async fn update(&self, event: &Event, attachments: &[NewAttachment]) -> Result<Event, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let updated = sqlx::query_as::<_, Event>(
            "UPDATE events SET title = ?, description = ?, mode = ?, category = ?, venue = ?, join_link = ?, contact_info = ?, total_seats = ?, requires_approval = ?, join_questions = ?, start_date = ?, end_date = ?, status = ?, organizer_id = ?, company_id = ? WHERE id = ? RETURNING *"
        )
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.mode)
            .bind(&event.category)
            .bind(&event.venue)
            .bind(&event.join_link)
            .bind(&event.contact_info)
            .bind(event.total_seats)
            .bind(event.requires_approval)
            .bind(&event.join_questions)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.status)
            .bind(event.organizer_id)
            .bind(event.company_id)
            .bind(event.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        // Delete-then-recreate: the caller passes the full replacement set.
        sqlx::query("DELETE FROM attachments WHERE event_id = ?")
            .bind(event.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for att in attachments {
            sqlx::query("INSERT INTO attachments (event_id, url, public_id, media_type) VALUES (?, ?, ?, ?)")
                .bind(event.id)
                .bind(&att.url)
                .bind(&att.public_id)
                .bind(&att.media_type)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn list_attachments(&self, event_id: i64) -> Result<Vec<Attachment>, AppError> {
        sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE event_id = ? ORDER BY id ASC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }
        Ok(())
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE events SET status = 'COMPLETED' WHERE status = 'ACTIVE' AND end_date < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
