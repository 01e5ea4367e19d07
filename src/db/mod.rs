use crate::config::SecurityConfig;
use crate::models::essay::{Essay, EssayKind, EssayQuery, NewEssay};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{KeyIssue, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if db_url.starts_with("sqlite:") && !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite:")
                .trim_start_matches("//")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn essay_repo(&self) -> repositories::essay::EssayRepository {
        repositories::essay::EssayRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .create(email, name, password, security)
            .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn payment_reference_owner(&self, reference: &str) -> Result<Option<i32>> {
        self.user_repo().reference_owner(reference).await
    }

    pub async fn issue_api_key(&self, user_id: i32, reference: &str) -> Result<KeyIssue> {
        self.user_repo().issue_api_key(user_id, reference).await
    }

    // ========== Essays ==========

    pub async fn create_essay(&self, essay: NewEssay) -> Result<Essay> {
        self.essay_repo().create(essay).await
    }

    pub async fn get_essay(&self, user_id: i32, id: i32) -> Result<Option<Essay>> {
        self.essay_repo().get(user_id, id).await
    }

    pub async fn list_essays(&self, user_id: i32, query: &EssayQuery) -> Result<Vec<Essay>> {
        self.essay_repo().list(user_id, query).await
    }

    pub async fn recent_drafts(&self, user_id: i32, limit: u64) -> Result<Vec<Essay>> {
        self.essay_repo().recent_drafts(user_id, limit).await
    }

    pub async fn count_essays(&self, user_id: i32, kind: Option<EssayKind>) -> Result<u64> {
        self.essay_repo().count(user_id, kind).await
    }

    pub async fn clear_essay_history(&self, user_id: i32) -> Result<u64> {
        self.essay_repo().clear_for_user(user_id).await
    }
}
