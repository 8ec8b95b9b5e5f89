//! `content` table queries

use super::StorageError;
use chrono::{DateTime, Utc};
use socialgen_common::models::{
    AggregateDimension, ContentFilter, ContentRecord, ContentType, NewContentRecord, Platform,
};
use sqlx::sqlite::SqliteArguments;
use sqlx::query::QueryAs;
use sqlx::{Sqlite, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;

const CREATE_CONTENT_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS content (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform TEXT NOT NULL,
        content_type TEXT NOT NULL,
        industry TEXT NOT NULL,
        tone TEXT NOT NULL,
        body TEXT NOT NULL,
        additional_context TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
"#;

const SELECT_COLUMNS: &str =
    "id, platform, content_type, industry, tone, body, additional_context, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    id: i64,
    platform: String,
    content_type: String,
    industry: String,
    tone: String,
    body: String,
    additional_context: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContentRow> for ContentRecord {
    type Error = StorageError;

    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        let platform: Platform = row
            .platform
            .parse()
            .map_err(|e| StorageError::CorruptRow(format!("row {}: {}", row.id, e)))?;
        let content_type: ContentType = row
            .content_type
            .parse()
            .map_err(|e| StorageError::CorruptRow(format!("row {}: {}", row.id, e)))?;

        Ok(ContentRecord {
            id: row.id,
            platform,
            content_type,
            industry: row.industry,
            tone: row.tone,
            body: row.body,
            additional_context: row.additional_context,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `WHERE ...` clause and its bind values, in placeholder order
fn where_clause(filter: &ContentFilter) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(platform) = filter.platform {
        clauses.push("platform = ?");
        values.push(platform.to_string());
    }
    if let Some(content_type) = filter.content_type {
        clauses.push("content_type = ?");
        values.push(content_type.to_string());
    }
    if let Some(industry) = filter.industry.as_deref() {
        clauses.push("industry = ?");
        values.push(industry.to_string());
    }
    if let Some(tone) = filter.tone.as_deref() {
        clauses.push("tone = ?");
        values.push(tone.to_string());
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn bind_filters<'q, O>(
    mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    values: Vec<String>,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in values {
        query = query.bind(value);
    }
    query
}

/// Gateway over the `content` table
#[derive(Debug, Clone)]
pub struct ContentStore {
    pool: SqlitePool,
}

impl ContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `content` table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_CONTENT_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a record and return its id
    ///
    /// `created_at` is set here; `updated_at` starts out NULL.
    pub async fn save(&self, record: &NewContentRecord) -> Result<i64, StorageError> {
        let created_at = socialgen_common::time::now();

        let result = sqlx::query(
            r#"
            INSERT INTO content
                (platform, content_type, industry, tone, body, additional_context, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(record.platform.to_string())
        .bind(record.content_type.to_string())
        .bind(&record.industry)
        .bind(&record.tone)
        .bind(&record.body)
        .bind(&record.additional_context)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, platform = %record.platform, content_type = %record.content_type, "Saved content");
        Ok(id)
    }

    /// Records matching the filter, newest first
    pub async fn list(&self, filter: &ContentFilter) -> Result<Vec<ContentRecord>, StorageError> {
        let (where_sql, values) = where_clause(filter);
        let mut sql = format!(
            "SELECT {} FROM content{} ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS, where_sql
        );
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = bind_filters(sqlx::query_as::<_, ContentRow>(&sql), values);
        if let Some(limit) = filter.limit {
            query = query.bind(limit.max(0));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(ContentRecord::try_from).collect()
    }

    /// One record by id
    pub async fn get(&self, id: i64) -> Result<Option<ContentRecord>, StorageError> {
        let sql = format!("SELECT {} FROM content WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ContentRecord::try_from).transpose()
    }

    /// Number of records matching the filter
    pub async fn count(&self, filter: &ContentFilter) -> Result<i64, StorageError> {
        let (where_sql, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM content{}", where_sql);
        let (count,) = bind_filters(sqlx::query_as::<_, (i64,)>(&sql), values)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Record counts grouped by one column over the whole table
    pub async fn aggregate(
        &self,
        dimension: AggregateDimension,
    ) -> Result<BTreeMap<String, i64>, StorageError> {
        self.aggregate_filtered(dimension, &ContentFilter::default()).await
    }

    /// Record counts grouped by one column over the filtered rows
    ///
    /// `limit` on the filter is ignored.
    pub async fn aggregate_filtered(
        &self,
        dimension: AggregateDimension,
        filter: &ContentFilter,
    ) -> Result<BTreeMap<String, i64>, StorageError> {
        let column = dimension.column();
        let (where_sql, values) = where_clause(filter);
        let sql = format!(
            "SELECT {col}, COUNT(*) FROM content{filter} GROUP BY {col}",
            col = column,
            filter = where_sql
        );

        let rows = bind_filters(sqlx::query_as::<_, (String, i64)>(&sql), values)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_empty() {
        let (sql, values) = where_clause(&ContentFilter::default());
        assert_eq!(sql, "");
        assert!(values.is_empty());
    }

    #[test]
    fn test_where_clause_order() {
        let filter = ContentFilter {
            platform: Some(Platform::TikTok),
            tone: Some("Playful".to_string()),
            ..ContentFilter::default()
        };
        let (sql, values) = where_clause(&filter);
        assert_eq!(sql, " WHERE platform = ? AND tone = ?");
        assert_eq!(values, vec!["TikTok", "Playful"]);
    }
}
