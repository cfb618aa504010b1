//! The ping history store, backed by either Postgres or Sqlite.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, SqlitePool, migrate::Migrator};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    argument_parsing::Args,
    history::HistoryQuery,
    probe::Status,
    shared_queries::{
        INSERT_INTO_PING_HISTORY_QUERY, SELECT_ONE_PING_ID_QUERY,
        SELECT_PING_HISTORY_SINCE_BY_SITE_QUERY, SELECT_PING_HISTORY_SINCE_QUERY,
    },
};

static POSTGRES_MIGRATOR: Migrator = sqlx::migrate!("./migrations_pg");
static SQLITE_MIGRATOR: Migrator = sqlx::migrate!("./migrations_sq");

/// One row of the append-only ping history.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PingRecord {
    pub id: String,
    pub site_id: String,
    pub site_name: String,
    pub site_url: String,
    pub response_time: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

/// A measurement waiting to be written. The id and timestamp are assigned
/// on insert.
#[derive(Debug, Clone)]
pub struct NewPingRecord {
    pub site_id: String,
    pub site_name: String,
    pub site_url: String,
    pub response_time: Option<i32>,
    pub status: Status,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Clone, Debug)]
pub enum Store {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl Store {
    pub async fn connect(args: &Args) -> Result<Self, sqlx::Error> {
        match args.postgres_url() {
            Some(pg_string) => Ok(Store::Postgres(PgPool::connect(pg_string).await?)),
            None => Ok(Store::Sqlite(SqlitePool::connect(&args.sqlite).await?)),
        }
    }

    /// Bring the schema up to date. Safe to run any number of times.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        match self {
            Self::Postgres(p) => POSTGRES_MIGRATOR.run(p).await?,
            Self::Sqlite(s) => SQLITE_MIGRATOR.run(s).await?,
        }
        Ok(())
    }

    /// Make sure `ping_history` can be written to, migrating if the table
    /// has not been created yet. The table is read again after migrating.
    pub async fn ensure_history_store(&self) -> Result<(), StoreError> {
        match self.check_history_table().await {
            Ok(()) => Ok(()),
            Err(e) if is_missing_table(&e) => {
                info!("ping_history table missing, running migrations");
                self.migrate().await?;
                self.check_history_table().await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn check_history_table(&self) -> Result<(), sqlx::Error> {
        match self {
            Self::Postgres(p) => sqlx::query(SELECT_ONE_PING_ID_QUERY)
                .fetch_optional(p)
                .await
                .map(|_| ()),
            Self::Sqlite(s) => sqlx::query(SELECT_ONE_PING_ID_QUERY)
                .fetch_optional(s)
                .await
                .map(|_| ()),
        }
    }

    pub async fn insert_record(&self, record: &NewPingRecord) -> Result<PingRecord, sqlx::Error> {
        let stored = PingRecord {
            id: Uuid::new_v4().to_string(),
            site_id: record.site_id.clone(),
            site_name: record.site_name.clone(),
            site_url: record.site_url.clone(),
            response_time: record.response_time,
            status: record.status,
            created_at: Utc::now(),
        };

        match self {
            Self::Postgres(p) => {
                sqlx::query(INSERT_INTO_PING_HISTORY_QUERY)
                    .bind(&stored.id)
                    .bind(&stored.site_id)
                    .bind(&stored.site_name)
                    .bind(&stored.site_url)
                    .bind(stored.response_time)
                    .bind(stored.status.as_str())
                    .bind(stored.created_at)
                    .execute(p)
                    .await?;
            }
            Self::Sqlite(s) => {
                sqlx::query(INSERT_INTO_PING_HISTORY_QUERY)
                    .bind(&stored.id)
                    .bind(&stored.site_id)
                    .bind(&stored.site_name)
                    .bind(&stored.site_url)
                    .bind(stored.response_time)
                    .bind(stored.status.as_str())
                    .bind(stored.created_at)
                    .execute(s)
                    .await?;
            }
        }

        Ok(stored)
    }

    /// Records inside the query window, oldest first. A store that has never
    /// been created reads as empty.
    pub async fn history(&self, query: &HistoryQuery) -> Result<Vec<PingRecord>, sqlx::Error> {
        let since = query.since(Utc::now());

        let records = match (self, query.site_id.as_deref()) {
            (Self::Postgres(p), None) => {
                sqlx::query_as::<_, PingRecord>(SELECT_PING_HISTORY_SINCE_QUERY)
                    .bind(since)
                    .fetch_all(p)
                    .await
            }
            (Self::Postgres(p), Some(site_id)) => {
                sqlx::query_as::<_, PingRecord>(SELECT_PING_HISTORY_SINCE_BY_SITE_QUERY)
                    .bind(since)
                    .bind(site_id)
                    .fetch_all(p)
                    .await
            }
            (Self::Sqlite(s), None) => {
                sqlx::query_as::<_, PingRecord>(SELECT_PING_HISTORY_SINCE_QUERY)
                    .bind(since)
                    .fetch_all(s)
                    .await
            }
            (Self::Sqlite(s), Some(site_id)) => {
                sqlx::query_as::<_, PingRecord>(SELECT_PING_HISTORY_SINCE_BY_SITE_QUERY)
                    .bind(since)
                    .bind(site_id)
                    .fetch_all(s)
                    .await
            }
        };

        match records {
            Err(e) if is_missing_table(&e) => Ok(Vec::new()),
            other => other,
        }
    }
}

/// Whether the error means `ping_history` (or any table) does not exist yet.
pub fn is_missing_table(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            // 42P01 is Postgres' undefined_table
            db.code().as_deref() == Some("42P01") || db.message().contains("no such table")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn fresh_sqlite() -> Store {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Store::Sqlite(pool)
    }

    fn record(site_id: &str, status: Status, response_time: i32) -> NewPingRecord {
        NewPingRecord {
            site_id: site_id.to_string(),
            site_name: format!("Site {site_id}"),
            site_url: format!("https://{site_id}.test"),
            response_time: Some(response_time),
            status,
        }
    }

    #[tokio::test]
    async fn missing_table_reads_as_empty() {
        let store = fresh_sqlite().await;
        let records = store.history(&HistoryQuery::default()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn missing_table_error_is_recognised() {
        let Store::Sqlite(pool) = fresh_sqlite().await else {
            unreachable!()
        };
        let err = sqlx::query(SELECT_ONE_PING_ID_QUERY)
            .fetch_optional(&pool)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(is_missing_table(&err));
        assert!(!is_missing_table(&sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn ensure_history_store_creates_then_is_a_no_op() {
        let store = fresh_sqlite().await;
        store.ensure_history_store().await.unwrap();
        store.ensure_history_store().await.unwrap();
        store.migrate().await.unwrap();

        // no placeholder rows are left behind
        let records = store.history(&HistoryQuery::default()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn dropped_table_with_applied_migrations_is_not_ready() {
        let store = fresh_sqlite().await;
        store.migrate().await.unwrap();
        let Store::Sqlite(pool) = &store else {
            unreachable!()
        };
        sqlx::query("DROP TABLE ping_history").execute(pool).await.unwrap();

        let err = store.ensure_history_store().await.unwrap_err();
        assert!(matches!(err, StoreError::Sql(ref e) if is_missing_table(e)));
    }

    #[tokio::test]
    async fn inserted_records_come_back_oldest_first() {
        let store = fresh_sqlite().await;
        store.migrate().await.unwrap();

        let first = store.insert_record(&record("a", Status::Up, 120)).await.unwrap();
        let second = store.insert_record(&record("b", Status::Slow, 1500)).await.unwrap();
        let third = store.insert_record(&record("a", Status::Down, 0)).await.unwrap();

        let records = store.history(&HistoryQuery::default()).await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[1].status, Status::Slow);
        assert_eq!(records[2].id, third.id);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn site_filter_is_an_exact_match() {
        let store = fresh_sqlite().await;
        store.migrate().await.unwrap();

        store.insert_record(&record("a", Status::Up, 100)).await.unwrap();
        store.insert_record(&record("ab", Status::Up, 100)).await.unwrap();

        let query = HistoryQuery {
            site_id: Some("a".to_string()),
            ..HistoryQuery::default()
        };
        let records = store.history(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].site_id, "a");

        let unknown = HistoryQuery {
            site_id: Some("zzz".to_string()),
            ..HistoryQuery::default()
        };
        assert!(store.history(&unknown).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_day_window_excludes_existing_records() {
        let store = fresh_sqlite().await;
        store.migrate().await.unwrap();
        store.insert_record(&record("a", Status::Up, 100)).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let query = HistoryQuery {
            days: 0,
            ..HistoryQuery::default()
        };
        assert!(store.history(&query).await.unwrap().is_empty());
    }
}
