use super::ResultRecord;
use crate::{utils, ScrapeError};
use futures::TryStreamExt;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};

/// One row per run, keyed by the run's `last_modified`. The record itself is
/// stored as JSON next to its news title.
pub struct ResultTable {
    name: String,
    pool: SqlitePool,
}

impl ResultTable {
    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        if !utils::is_table_exists(&self.pool, &self.name).await? {
            let query = format!(
                r#"
                    CREATE TABLE {} (
                        id TEXT PRIMARY KEY,
                        created_at DATETIME,
                        news_title TEXT,
                        record TEXT
                    )
                "#,
                &self.name
            );
            sqlx::query(query.as_str()).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Stores one run. Saving the same run again replaces it.
    async fn insert(&self, id: &str, news_title: &str, record: &str) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT OR REPLACE INTO {} (id, created_at, news_title, record) VALUES (?, ?, ?, ?)",
            &self.name
        );
        sqlx::query(&query)
            .bind(id)
            .bind(utils::get_now())
            .bind(news_title)
            .bind(record)
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u32, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", &self.name);
        sqlx::query(&query).fetch_one(&self.pool).await?.try_get(0)
    }
}

/// The sqlite store the scraped records are handed to.
pub struct MarsData {
    pub name: String,
    pub results: ResultTable,
    pool: SqlitePool,
}

impl MarsData {
    /// Opens (creating if needed) `<name>.db`.
    pub async fn new(name: &str) -> Result<MarsData, ScrapeError> {
        let opt = SqliteConnectOptions::new()
            .filename(format!("{}.db", name))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let p = MarsData {
            name: name.to_string(),
            results: ResultTable {
                name: format!("{}_results", name),
                pool: pool.clone(),
            },
            pool,
        };

        if !utils::is_table_exists(&p.pool, &p.results.name).await? {
            tracing::debug!("Create table {}", p.results.name);
            p.results.create().await?;
        } else {
            tracing::debug!("Use table {}", p.results.name);
        }

        Ok(p)
    }

    pub async fn save(&self, record: &ResultRecord) -> Result<(), ScrapeError> {
        let json = serde_json::to_string(record)?;
        self.results
            .insert(
                &record.last_modified.to_rfc3339(),
                &record.news.title,
                &json,
            )
            .await?;
        Ok(())
    }

    /// The most recently scraped record, if any run was stored.
    pub async fn latest(&self) -> Result<Option<ResultRecord>, ScrapeError> {
        let query = format!(
            "SELECT record FROM {} ORDER BY created_at DESC LIMIT 1",
            self.results.get_name()
        );
        match sqlx::query(&query).fetch_optional(&self.pool).await? {
            Some(row) => {
                let json: String = row.try_get("record")?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    /// Every stored run as `(id, news title)`, oldest first.
    pub async fn history(&self) -> Result<Vec<(String, String)>, ScrapeError> {
        let mut runs = vec![];
        let query = format!(
            "SELECT id, news_title FROM {} ORDER BY created_at",
            self.results.get_name()
        );
        let mut rows = sqlx::query(&query).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            runs.push((row.try_get("id")?, row.try_get("news_title")?));
        }
        Ok(runs)
    }
}
