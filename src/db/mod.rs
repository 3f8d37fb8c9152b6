//! Persistence for applications and users.
//!
//! Handlers only ever see [`Storage`]; the backend behind it is chosen at
//! startup from configuration. Column names are snake_case in every backend
//! and the translation to the camelCase wire names lives in the model types.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::core::config::{Backend, DatabaseConfig};
use crate::core::AppError;
use crate::models::applications::{ApplicationWithRelations, NewApplication};
use crate::models::users::{NewUser, User};

pub mod memory;
pub mod mysql;
pub mod postgres;
mod rows;

pub use memory::InMemoryStorage;
pub use mysql::MySqlStorage;
pub use postgres::PgStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Inserts the application, its guardians and its affiliations in one
    /// transaction and returns the enriched record.
    async fn create_application(
        &self,
        application: &NewApplication,
    ) -> Result<ApplicationWithRelations, AppError>;

    /// Every application, most recent submission first.
    async fn get_all_applications(&self) -> Result<Vec<ApplicationWithRelations>, AppError>;

    async fn get_application_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ApplicationWithRelations>, AppError>;

    /// Case-insensitive substring match on first name, surname, student id,
    /// sport and faculty. A blank query returns everything.
    async fn search_applications(
        &self,
        query: &str,
    ) -> Result<Vec<ApplicationWithRelations>, AppError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Releases pooled connections.
    async fn close(&self);
}

/// Builds the configured backend. Pools connect lazily on first use.
pub async fn connect_storage(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.backend {
        Backend::Postgres => {
            let settings = config
                .postgres
                .as_ref()
                .context("database.postgres settings are missing")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout())
                .connect_lazy_with(settings.connect());

            if config.run_migrations {
                sqlx::migrate!("./migrations/postgres")
                    .run(&pool)
                    .await
                    .context("failed to run postgres migrations")?;
            }

            Ok(Arc::new(PgStorage::new(pool)))
        }
        Backend::Mysql => {
            let settings = config
                .mysql
                .as_ref()
                .context("database.mysql settings are missing")?;

            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout())
                .connect_lazy_with(settings.connect());

            if config.run_migrations {
                sqlx::migrate!("./migrations/mysql")
                    .run(&pool)
                    .await
                    .context("failed to run mysql migrations")?;
            }

            Ok(Arc::new(MySqlStorage::new(pool)))
        }
        Backend::Memory => {
            tracing::warn!("using the in-memory backend; submissions will not survive a restart");
            Ok(Arc::new(InMemoryStorage::default()))
        }
    }
}

/// Submission time at the microsecond precision every backend stores.
pub(crate) fn submission_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `%query%`, passed to LIKE unescaped.
pub(crate) fn search_pattern(query: &str) -> String {
    format!("%{}%", query)
}
