// SQLite EntityStore Implementation
//
// Each collection is a table of JSON documents ordered by an autoincrement
// sequence. A WriteBatch runs inside one SQL transaction; an error drops the
// transaction, which rolls it back.

use crate::{create_pool, map_sqlx_error, run_migrations};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection};
use sqlx::SqlitePool;
use talentflow_core::error::{AppError, Result};
use talentflow_core::port::{
    merge_fields, Collection, EntityStore, IndexKey, IndexQuery, Record, WriteBatch, WriteOp,
};
use tracing::debug;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct SqliteEntityStore {
    pool: SqlitePool,
}

impl SqliteEntityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and migrate in one step.
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn bind_key(query: SqliteQuery<'_>, key: Option<IndexKey>) -> SqliteQuery<'_> {
    match key {
        Some(IndexKey::Int(n)) => query.bind(n),
        Some(IndexKey::Text(s)) => query.bind(s),
        None => query.bind(Option::<i64>::None),
    }
}

fn to_record(collection: Collection, (id, body): (String, String)) -> Result<Record> {
    let body = serde_json::from_str(&body).map_err(|e| {
        AppError::Database(format!("corrupt {} document {}: {}", collection, id, e))
    })?;
    Ok(Record { id, body })
}

fn to_records(collection: Collection, rows: Vec<(String, String)>) -> Result<Vec<Record>> {
    rows.into_iter().map(|row| to_record(collection, row)).collect()
}

async fn insert(conn: &mut SqliteConnection, collection: Collection, record: &Record) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, index_key, body) VALUES (?, ?, ?)",
        collection.name()
    );
    let query = sqlx::query(&sql).bind(&record.id);
    bind_key(query, record.index_key(collection))
        .bind(record.body.to_string())
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

async fn upsert(conn: &mut SqliteConnection, collection: Collection, record: &Record) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, index_key, body) VALUES (?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET index_key = excluded.index_key, body = excluded.body",
        collection.name()
    );
    let query = sqlx::query(&sql).bind(&record.id);
    bind_key(query, record.index_key(collection))
        .bind(record.body.to_string())
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

async fn merge(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
    fields: &serde_json::Map<String, serde_json::Value>,
) -> Result<()> {
    let select = format!("SELECT id, body FROM {} WHERE id = ?", collection.name());
    let row: Option<(String, String)> = sqlx::query_as(&select)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    let mut record = match row {
        Some(row) => to_record(collection, row)?,
        None => return Err(AppError::NotFound(format!("{} {}", collection, id))),
    };
    merge_fields(&mut record.body, fields);

    let update = format!(
        "UPDATE {} SET index_key = ?, body = ? WHERE id = ?",
        collection.name()
    );
    bind_key(sqlx::query(&update), record.index_key(collection))
        .bind(record.body.to_string())
        .bind(id)
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let sql = format!("SELECT id, body FROM {} WHERE id = ?", collection.name());
        let row: Option<(String, String)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(|row| to_record(collection, row)).transpose()
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<Record>> {
        let sql = format!("SELECT id, body FROM {} ORDER BY seq", collection.name());
        let rows: Vec<(String, String)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        to_records(collection, rows)
    }

    async fn lookup(&self, collection: Collection, query: &IndexQuery) -> Result<Vec<Record>> {
        let rows: Vec<(String, String)> = match query {
            IndexQuery::Eq(key) => {
                let sql = format!(
                    "SELECT id, body FROM {} WHERE index_key = ? ORDER BY seq",
                    collection.name()
                );
                let q = sqlx::query_as::<_, (String, String)>(&sql);
                let q = match key {
                    IndexKey::Int(n) => q.bind(*n),
                    IndexKey::Text(s) => q.bind(s.as_str()),
                };
                q.fetch_all(&self.pool).await.map_err(map_sqlx_error)?
            }
            IndexQuery::Between { start, end } => {
                let sql = format!(
                    "SELECT id, body FROM {} WHERE index_key BETWEEN ? AND ? ORDER BY seq",
                    collection.name()
                );
                sqlx::query_as::<_, (String, String)>(&sql)
                    .bind(*start)
                    .bind(*end)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?
            }
        };
        to_records(collection, rows)
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.name());
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count as usize)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let size = batch.len();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for op in batch.ops() {
            match op {
                WriteOp::Add { collection, record } => insert(&mut tx, *collection, record).await?,
                WriteOp::Put { collection, record } => upsert(&mut tx, *collection, record).await?,
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                } => merge(&mut tx, *collection, id, fields).await?,
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(operations = size, "Write batch committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use talentflow_core::domain::{Candidate, Job, NewCandidate, NewJob, Stage};
    use talentflow_core::port::table;
    use talentflow_core::ErrorKind;

    async fn store() -> SqliteEntityStore {
        SqliteEntityStore::open("sqlite::memory:").await.unwrap()
    }

    fn job(id: &str, order: i64) -> Job {
        Job::create(id, order, 0, NewJob::titled(format!("Role {}", id))).unwrap()
    }

    #[tokio::test]
    async fn test_add_get_and_duplicate_key() {
        let store = store().await;
        let jobs = table::<Job>(&store);

        jobs.add(&job("job-1", 0)).await.unwrap();
        assert_eq!(jobs.get_required("job-1").await.unwrap(), job("job-1", 0));

        let err = jobs.add(&job("job-1", 3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert!(jobs.get("job-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let store = store().await;
        let jobs = table::<Job>(&store);
        jobs.add(&job("job-1", 0)).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.add(&job("job-2", 1)).unwrap();
        batch.update::<Job>("job-1", &json!({"order": 5})).unwrap();
        batch.update::<Job>("job-404", &json!({"order": 1})).unwrap();
        let err = store.commit(batch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(jobs.count().await.unwrap(), 1);
        assert_eq!(jobs.get_required("job-1").await.unwrap().order, 0);
    }

    #[tokio::test]
    async fn test_update_reindexes_document() {
        let store = store().await;
        let jobs = table::<Job>(&store);
        jobs.bulk_add(&[job("job-1", 0), job("job-2", 1), job("job-3", 2)])
            .await
            .unwrap();

        jobs.update("job-1", &json!({"order": 9})).await.unwrap();

        let low = jobs.lookup(&IndexQuery::between(0, 2)).await.unwrap();
        let ids: Vec<&str> = low.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["job-2", "job-3"]);
        let moved = jobs.lookup(&IndexQuery::eq(9)).await.unwrap();
        assert_eq!(moved[0].id, "job-1");
    }

    #[tokio::test]
    async fn test_text_index_and_insertion_order() {
        let store = store().await;
        let mut batch = WriteBatch::new();
        for (id, stage) in [("c2", Stage::Tech), ("c1", Stage::Applied), ("c3", Stage::Tech)] {
            let candidate = Candidate::create(
                id,
                0,
                NewCandidate {
                    name: format!("Person {}", id),
                    email: format!("{}@example.com", id),
                    stage: Some(stage),
                    job_id: "job-1".into(),
                    ..Default::default()
                },
            )
            .unwrap();
            batch.add(&candidate).unwrap();
        }
        store.commit(batch).await.unwrap();

        let tech = store
            .lookup(Collection::Candidates, &IndexQuery::eq("tech"))
            .await
            .unwrap();
        let ids: Vec<&str> = tech.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c3"]);

        let all = store.scan(Collection::Candidates).await.unwrap();
        assert_eq!(all[1].id, "c1");
        assert_eq!(store.count(Collection::Candidates).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_put_upserts_in_place() {
        let store = store().await;
        let jobs = table::<Job>(&store);
        jobs.bulk_add(&[job("job-1", 0), job("job-2", 1)]).await.unwrap();

        let mut renamed = job("job-1", 0);
        renamed.title = "Renamed".into();
        jobs.put(&renamed).await.unwrap();
        jobs.put(&job("job-3", 2)).await.unwrap();

        let titles: Vec<String> = jobs.all().await.unwrap().into_iter().map(|j| j.title).collect();
        assert_eq!(titles, vec!["Renamed", "Role job-2", "Role job-3"]);
    }
}
