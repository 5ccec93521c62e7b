use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, CompanyRepository, EmailService, EventRepository,
    ParticipationRepository, UserRepository,
};
use crate::domain::services::auth_service::AuthService;
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub company_repo: Arc<dyn CompanyRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub participation_repo: Arc<dyn ParticipationRepository>,
    pub auth_service: Arc<AuthService>,
    pub email_service: Arc<dyn EmailService>,
    pub templates: Arc<Tera>,
}
