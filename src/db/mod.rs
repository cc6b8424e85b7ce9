use std::str::FromStr;

use anyhow::Context as _;
use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;

use crate::utils::config::DbConfig;

pub type Db = SqlitePool;

pub mod submission;

use submission::{CreateSubmission, Submission};

/// Create a new db connection pool, initializing and running migrations if necessary.
pub async fn init(db_config: &DbConfig) -> anyhow::Result<Db> {
    let options = SqliteConnectOptions::from_str(&db_config.url)
        .with_context(|| format!("parsing db url={}", db_config.url))?
        .create_if_missing(true);
    let db = SqlitePool::connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    Ok(db)
}

/// Private in-memory database with migrations applied.
///
/// Pinned to a single connection which never expires, since each `:memory:` connection is its own database.
#[cfg(test)]
pub async fn memory() -> Db {
    let db = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&db).await.unwrap();
    db
}

/// Where contact submissions are durably appended.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Store a new submission, returning its id.
    async fn insert(&self, submission: &CreateSubmission) -> anyhow::Result<i64>;
}

#[async_trait]
impl SubmissionStore for Db {
    async fn insert(&self, submission: &CreateSubmission) -> anyhow::Result<i64> {
        Submission::create(self, submission).await
    }
}
