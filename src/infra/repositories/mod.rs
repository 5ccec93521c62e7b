pub mod postgres_auth_repo;
pub mod postgres_company_repo;
pub mod postgres_event_repo;
pub mod postgres_participation_repo;
pub mod postgres_user_repo;
pub mod sqlite_auth_repo;
pub mod sqlite_company_repo;
pub mod sqlite_event_repo;
pub mod sqlite_participation_repo;
pub mod sqlite_user_repo;
