//! Durable record of hosted sites.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Pool;
use sqlx::Sqlite;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqliteJournalMode;
use sqlx::sqlite::SqlitePoolOptions;

use crate::RegistryError;
use crate::site::Site;
use crate::site::SiteId;

const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS sites(
    site_id TEXT PRIMARY KEY,
    creation_date INTEGER,
    expiry_date INTEGER
)";

/// Storage for site rows keyed by site id.
///
/// Every mutation is a single statement, so concurrent readers never see a
/// partially written row.
#[async_trait]
pub trait SiteRegistry: Send + Sync {
    /// Records a new site.
    ///
    /// Fails with [`RegistryError::DuplicateId`] if the id is taken.
    async fn insert(&self, site: &Site) -> Result<(), RegistryError>;

    /// Looks up one site.
    async fn get(&self, site_id: &SiteId) -> Result<Option<Site>, RegistryError>;

    /// Ids of every site whose expiry is strictly before `now`, in no
    /// particular order.
    ///
    /// Expired rows whose id is not a valid [`SiteId`] cannot name a site
    /// directory; implementations drop them instead of returning them.
    async fn list_expired(&self, now: i64) -> Result<Vec<SiteId>, RegistryError>;

    /// Removes a site row. Returns `false` if there was none.
    async fn delete(&self, site_id: &SiteId) -> Result<bool, RegistryError>;
}

/// SQLite-backed [`SiteRegistry`].
#[derive(Debug, Clone)]
pub struct SqliteRegistry {
    pool: Pool<Sqlite>,
}

impl SqliteRegistry {
    /// Opens (creating if needed) the database at `path` and ensures the
    /// `sites` table exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        // One connection serializes writers and avoids "database is locked".
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        tracing::debug!(path = %path.display(), "site registry opened");
        Ok(Self { pool })
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SiteRegistry for SqliteRegistry {
    async fn insert(&self, site: &Site) -> Result<(), RegistryError> {
        let result = sqlx::query("INSERT INTO sites VALUES(?, ?, ?)")
            .bind(site.site_id.as_str())
            .bind(site.creation_date)
            .bind(site.expiry_date)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RegistryError::DuplicateId {
                    site_id: site.site_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, site_id: &SiteId) -> Result<Option<Site>, RegistryError> {
        let row: Option<(i64, i64)> =
            sqlx::query_as("SELECT creation_date, expiry_date FROM sites WHERE site_id = ?")
                .bind(site_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(creation_date, expiry_date)| Site {
            site_id: site_id.clone(),
            creation_date,
            expiry_date,
        }))
    }

    async fn list_expired(&self, now: i64) -> Result<Vec<SiteId>, RegistryError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT site_id FROM sites WHERE expiry_date < ?")
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        let mut expired = Vec::with_capacity(rows.len());
        for (raw,) in rows {
            match SiteId::parse(&raw) {
                Some(site_id) => expired.push(site_id),
                None => {
                    tracing::warn!(site_id = %raw, "dropping registry row with malformed site id");
                    sqlx::query("DELETE FROM sites WHERE site_id = ?")
                        .bind(&raw)
                        .execute(&self.pool)
                        .await?;
                }
            }
        }
        Ok(expired)
    }

    async fn delete(&self, site_id: &SiteId) -> Result<bool, RegistryError> {
        let result = sqlx::query("DELETE FROM sites WHERE site_id = ?")
            .bind(site_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn registry() -> (TempDir, SqliteRegistry) {
        let temp = TempDir::new().unwrap();
        let registry = SqliteRegistry::open(temp.path().join("sites.db"))
            .await
            .unwrap();
        (temp, registry)
    }

    fn site(id: &str, creation_date: i64, expiry_date: i64) -> Site {
        Site {
            site_id: SiteId::parse(id).unwrap(),
            creation_date,
            expiry_date,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (_temp, registry) = registry().await;
        let row = site("abc", 10, 20);
        registry.insert(&row).await.unwrap();

        assert_eq!(registry.get(&row.site_id).await.unwrap(), Some(row));
        let missing = SiteId::parse("zzz").unwrap();
        assert_eq!(registry.get(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_id() {
        let (_temp, registry) = registry().await;
        registry.insert(&site("abc", 10, 20)).await.unwrap();

        let err = registry.insert(&site("abc", 11, 21)).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { site_id } if site_id == "abc"));
    }

    #[tokio::test]
    async fn test_list_expired_is_strict() {
        let (_temp, registry) = registry().await;
        registry.insert(&site("old", 0, 50)).await.unwrap();
        registry.insert(&site("edge", 0, 100)).await.unwrap();
        registry.insert(&site("new", 0, 200)).await.unwrap();

        let expired = registry.list_expired(100).await.unwrap();
        assert_eq!(expired, vec![SiteId::parse("old").unwrap()]);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp, registry) = registry().await;
        let row = site("abc", 0, 1);
        registry.insert(&row).await.unwrap();

        assert!(registry.delete(&row.site_id).await.unwrap());
        assert!(!registry.delete(&row.site_id).await.unwrap());
        assert!(registry.list_expired(i64::MAX).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sites.db");
        let first = SqliteRegistry::open(&path).await.unwrap();
        first.insert(&site("abc", 1, 2)).await.unwrap();
        first.close().await;

        let second = SqliteRegistry::open(&path).await.unwrap();
        let id = SiteId::parse("abc").unwrap();
        assert!(second.get(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_malformed_expired_rows_dropped() {
        let (_temp, registry) = registry().await;
        sqlx::query("INSERT INTO sites VALUES('../escape', 0, 1)")
            .execute(&registry.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sites VALUES('bad id', 0, 100)")
            .execute(&registry.pool)
            .await
            .unwrap();
        registry.insert(&site("good", 0, 1)).await.unwrap();

        let expired = registry.list_expired(10).await.unwrap();
        assert_eq!(expired, vec![SiteId::parse("good").unwrap()]);
        assert_eq!(row_count(&registry).await, 2);

        // The unexpired malformed row goes once it expires too.
        assert_eq!(registry.list_expired(1000).await.unwrap().len(), 1);
        assert_eq!(row_count(&registry).await, 1);
    }

    async fn row_count(registry: &SqliteRegistry) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sites")
            .fetch_one(&registry.pool)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_open_path_with_query_characters() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sites?v=1#main.db");
        let registry = SqliteRegistry::open(&path).await.unwrap();
        registry.insert(&site("abc", 1, 2)).await.unwrap();

        assert!(path.is_file());
        registry.close().await;
    }
}
