use event_backend::{
    api::handlers::auth::hash_password,
    api::router::create_router,
    config::Config,
    domain::models::company::NewCompany,
    domain::models::event::{EventMode, NewAttachment, NewEvent},
    domain::models::user::{NewUser, Role},
    domain::ports::EmailService,
    domain::services::auth_service::AuthService,
    error::AppError,
    infra::factory::load_templates,
    infra::repositories::{
        sqlite_auth_repo::SqliteAuthRepo, sqlite_company_repo::SqliteCompanyRepo,
        sqlite_event_repo::SqliteEventRepo, sqlite_participation_repo::SqliteParticipationRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
}

/// Records every send so tests can assert on notification behavior.
pub struct RecordingEmailService {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _text_body: &str,
        _html_body: Option<&str>,
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }
}

/// Always fails, for the degraded-success path.
pub struct FailingEmailService;

#[async_trait]
impl EmailService for FailingEmailService {
    async fn send(
        &self,
        _recipient: &str,
        _subject: &str,
        _text_body: &str,
        _html_body: Option<&str>,
    ) -> Result<(), AppError> {
        Err(AppError::InternalWithMsg("mail relay down".into()))
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub mails: Arc<Mutex<Vec<SentMail>>>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let mails = Arc::new(Mutex::new(Vec::new()));
        let email_service = Arc::new(RecordingEmailService { sent: mails.clone() });
        Self::with_email_service(email_service, mails).await
    }

    pub async fn with_failing_mail() -> Self {
        let mails = Arc::new(Mutex::new(Vec::new()));
        Self::with_email_service(Arc::new(FailingEmailService), mails).await
    }

    async fn with_email_service(
        email_service: Arc<dyn EmailService>,
        mails: Arc<Mutex<Vec<SentMail>>>,
    ) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            jwt_secret: "test-secret".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            otp_ttl_minutes: 10,
            reset_ttl_minutes: 60,
        };

        let state = Arc::new(AppState {
            config: config.clone(),
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth_repo: Arc::new(SqliteAuthRepo::new(pool.clone())),
            company_repo: Arc::new(SqliteCompanyRepo::new(pool.clone())),
            event_repo: Arc::new(SqliteEventRepo::new(pool.clone())),
            participation_repo: Arc::new(SqliteParticipationRepo::new(pool.clone())),
            auth_service: Arc::new(AuthService::new(&config)),
            email_service,
            templates: Arc::new(load_templates()),
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            mails,
        }
    }

    pub fn sent_mails(&self) -> Vec<SentMail> {
        self.mails.lock().unwrap().clone()
    }

    /// Creates a verified user with the given role (profile included) and
    /// returns a Bearer token for it.
    pub async fn seed_user(&self, email: &str, role: Role) -> (i64, String) {
        let user = self
            .state
            .user_repo
            .create_with_profile(&NewUser {
                email: email.to_string(),
                name: Some(email.split('@').next().unwrap().to_string()),
                password_hash: Some(hash_password("password123").unwrap()),
                role,
            })
            .await
            .expect("seed user");
        let token = self.state.auth_service.issue_token(&user).unwrap();
        (user.id, token)
    }

    /// Organizer user + profile + owned company. Returns
    /// (token, organizer_profile_id, company_id).
    pub async fn seed_organizer(&self, email: &str) -> (String, i64, i64) {
        let (user_id, token) = self.seed_user(email, Role::Organizer).await;
        let profile = self
            .state
            .user_repo
            .find_organizer_profile(user_id)
            .await
            .unwrap()
            .expect("organizer profile");
        let company = self
            .state
            .company_repo
            .create(&NewCompany {
                name: format!("{} Co", email.split('@').next().unwrap()),
                description: None,
                owner_id: profile.id,
            })
            .await
            .expect("seed company");
        (token, profile.id, company.id)
    }

    /// Participant user + profile. Returns (token, participant_profile_id).
    pub async fn seed_participant(&self, email: &str) -> (String, i64) {
        let (user_id, token) = self.seed_user(email, Role::Participant).await;
        let profile = self
            .state
            .user_repo
            .find_participant_profile(user_id)
            .await
            .unwrap()
            .expect("participant profile");
        (token, profile.id)
    }

    pub async fn seed_event(
        &self,
        organizer_id: i64,
        company_id: i64,
        requires_approval: bool,
        total_seats: Option<i64>,
        end_date: DateTime<Utc>,
    ) -> i64 {
        let event = self
            .state
            .event_repo
            .create(
                &NewEvent {
                    title: "Rust Meetup".to_string(),
                    description: "Talks and pizza".to_string(),
                    mode: EventMode::Onsite,
                    category: Some("tech".to_string()),
                    venue: Some("Main hall".to_string()),
                    join_link: None,
                    contact_info: Some("host@example.com".to_string()),
                    total_seats,
                    requires_approval,
                    join_questions: None,
                    start_date: end_date - Duration::hours(2),
                    end_date,
                    organizer_id,
                    company_id,
                },
                &[NewAttachment {
                    url: "https://cdn.example.com/banner.png".to_string(),
                    public_id: Some("banner".to_string()),
                    media_type: "IMAGE".to_string(),
                }],
            )
            .await
            .expect("seed event");
        event.id
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::from(json!({}).to_string()),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
