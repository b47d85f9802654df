// Entity Store Port (Interface)
//
// Collections hold JSON documents keyed by id, with one designated secondary
// index per collection. Typed access goes through `Table<E>`.

use crate::domain::{Assessment, AssessmentResponse, Candidate, Job, TimelineEvent};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// Keyed collections of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Jobs,
    Candidates,
    Timeline,
    Assessments,
    AssessmentResponses,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Jobs,
        Collection::Candidates,
        Collection::Timeline,
        Collection::Assessments,
        Collection::AssessmentResponses,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Candidates => "candidates",
            Collection::Timeline => "candidate_timeline",
            Collection::Assessments => "assessments",
            Collection::AssessmentResponses => "assessment_responses",
        }
    }

    /// Document field backing the collection's secondary index
    pub fn index_field(&self) -> &'static str {
        match self {
            Collection::Jobs => "order",
            Collection::Candidates => "stage",
            Collection::Timeline => "candidateId",
            Collection::Assessments => "jobId",
            Collection::AssessmentResponses => "assessmentId",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Secondary index value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Int(i64),
    Text(String),
}

impl IndexKey {
    /// Extract the index value of a document (`None` when the field is absent or not scalar).
    pub fn from_body(collection: Collection, body: &Value) -> Option<IndexKey> {
        match body.get(collection.index_field())? {
            Value::Number(n) => n.as_i64().map(IndexKey::Int),
            Value::String(s) => Some(IndexKey::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Text(value.to_string())
    }
}

impl From<i64> for IndexKey {
    fn from(value: i64) -> Self {
        IndexKey::Int(value)
    }
}

/// Index lookup: equality, or an inclusive integer range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexQuery {
    Eq(IndexKey),
    Between { start: i64, end: i64 },
}

impl IndexQuery {
    pub fn eq(key: impl Into<IndexKey>) -> Self {
        IndexQuery::Eq(key.into())
    }

    pub fn between(start: i64, end: i64) -> Self {
        IndexQuery::Between { start, end }
    }

    pub fn matches(&self, key: Option<&IndexKey>) -> bool {
        match (self, key) {
            (IndexQuery::Eq(expected), Some(actual)) => expected == actual,
            (IndexQuery::Between { start, end }, Some(IndexKey::Int(n))) => start <= n && n <= end,
            _ => false,
        }
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub body: Value,
}

impl Record {
    pub fn index_key(&self, collection: Collection) -> Option<IndexKey> {
        IndexKey::from_body(collection, &self.body)
    }
}

/// One write inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert; fails with DuplicateKey when the id exists
    Add { collection: Collection, record: Record },
    /// Insert or replace
    Put { collection: Collection, record: Record },
    /// Shallow field merge; fails with NotFound when the id is absent
    Update {
        collection: Collection,
        id: String,
        fields: Map<String, Value>,
    },
}

/// Writes applied all-or-nothing by [`EntityStore::commit`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<E: Entity>(&mut self, entity: &E) -> Result<&mut Self> {
        self.ops.push(WriteOp::Add {
            collection: E::COLLECTION,
            record: entity.to_record()?,
        });
        Ok(self)
    }

    pub fn put<E: Entity>(&mut self, entity: &E) -> Result<&mut Self> {
        self.ops.push(WriteOp::Put {
            collection: E::COLLECTION,
            record: entity.to_record()?,
        });
        Ok(self)
    }

    /// Merge the serialized fields of `patch` into the stored document.
    pub fn update<E: Entity>(&mut self, id: &str, patch: &impl Serialize) -> Result<&mut Self> {
        let fields = match serde_json::to_value(patch)? {
            Value::Object(fields) => fields,
            other => {
                return Err(AppError::Validation(format!(
                    "partial update must be an object, got {}",
                    other
                )))
            }
        };
        self.ops.push(WriteOp::Update {
            collection: E::COLLECTION,
            id: id.to_string(),
            fields,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Shallow merge of `fields` into a document. The `id` field is never overwritten.
pub fn merge_fields(body: &mut Value, fields: &Map<String, Value>) {
    if let Value::Object(target) = body {
        for (key, value) in fields {
            if key != "id" {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Entity Store interface
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one document by id
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>>;

    /// All documents in insertion order
    async fn scan(&self, collection: Collection) -> Result<Vec<Record>>;

    /// Documents whose secondary index matches, in insertion order
    async fn lookup(&self, collection: Collection, query: &IndexQuery) -> Result<Vec<Record>>;

    /// Number of documents
    async fn count(&self, collection: Collection) -> Result<usize>;

    /// Apply every write or none of them
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// A domain type stored in one collection
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn to_record(&self) -> Result<Record> {
        Ok(Record {
            id: self.id().to_string(),
            body: serde_json::to_value(self)?,
        })
    }

    fn from_record(record: Record) -> Result<Self> {
        serde_json::from_value(record.body).map_err(|e| {
            AppError::Internal(format!(
                "corrupt {} document {}: {}",
                Self::COLLECTION,
                record.id,
                e
            ))
        })
    }
}

impl Entity for Job {
    const COLLECTION: Collection = Collection::Jobs;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Candidate {
    const COLLECTION: Collection = Collection::Candidates;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for TimelineEvent {
    const COLLECTION: Collection = Collection::Timeline;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Assessment {
    const COLLECTION: Collection = Collection::Assessments;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for AssessmentResponse {
    const COLLECTION: Collection = Collection::AssessmentResponses;
    fn id(&self) -> &str {
        &self.id
    }
}

/// Typed view of one collection
pub struct Table<'a, E> {
    store: &'a dyn EntityStore,
    _entity: PhantomData<fn() -> E>,
}

pub fn table<E: Entity>(store: &dyn EntityStore) -> Table<'_, E> {
    Table {
        store,
        _entity: PhantomData,
    }
}

impl<'a, E: Entity> Table<'a, E> {
    pub async fn get(&self, id: &str) -> Result<Option<E>> {
        match self.store.get(E::COLLECTION, id).await? {
            Some(record) => Ok(Some(E::from_record(record)?)),
            None => Ok(None),
        }
    }

    pub async fn get_required(&self, id: &str) -> Result<E> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", E::COLLECTION, id)))
    }

    pub async fn all(&self) -> Result<Vec<E>> {
        let records = self.store.scan(E::COLLECTION).await?;
        records.into_iter().map(E::from_record).collect()
    }

    pub async fn lookup(&self, query: &IndexQuery) -> Result<Vec<E>> {
        let records = self.store.lookup(E::COLLECTION, query).await?;
        records.into_iter().map(E::from_record).collect()
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count(E::COLLECTION).await
    }

    pub async fn add(&self, entity: &E) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.add(entity)?;
        self.store.commit(batch).await
    }

    pub async fn put(&self, entity: &E) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(entity)?;
        self.store.commit(batch).await
    }

    pub async fn bulk_add(&self, entities: &[E]) -> Result<()> {
        let mut batch = WriteBatch::new();
        for entity in entities {
            batch.add(entity)?;
        }
        self.store.commit(batch).await
    }

    /// Merge a partial update and return the stored result
    pub async fn update(&self, id: &str, patch: &(impl Serialize + Sync)) -> Result<E> {
        let mut batch = WriteBatch::new();
        batch.update::<E>(id, patch)?;
        self.store.commit(batch).await?;
        self.get_required(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_key_extraction() {
        let job = json!({"id": "job-1", "order": 3});
        assert_eq!(
            IndexKey::from_body(Collection::Jobs, &job),
            Some(IndexKey::Int(3))
        );

        let event = json!({"id": "t1", "candidateId": "c1"});
        assert_eq!(
            IndexKey::from_body(Collection::Timeline, &event),
            Some(IndexKey::Text("c1".into()))
        );
        assert_eq!(IndexKey::from_body(Collection::Candidates, &event), None);
    }

    #[test]
    fn test_range_query_is_inclusive() {
        let query = IndexQuery::between(2, 5);
        assert!(query.matches(Some(&IndexKey::Int(2))));
        assert!(query.matches(Some(&IndexKey::Int(5))));
        assert!(!query.matches(Some(&IndexKey::Int(6))));
        assert!(!query.matches(Some(&IndexKey::Text("3".into()))));
        assert!(!query.matches(None));
    }

    #[test]
    fn test_merge_fields_is_shallow_and_keeps_id() {
        let mut body = json!({"id": "c1", "name": "Ada", "stage": "applied"});
        let fields = json!({"id": "other", "stage": "screen"});
        merge_fields(&mut body, fields.as_object().unwrap());
        assert_eq!(body, json!({"id": "c1", "name": "Ada", "stage": "screen"}));
    }

    #[test]
    fn test_update_requires_object_patch() {
        let mut batch = WriteBatch::new();
        assert!(batch.update::<Job>("job-1", &json!(5)).is_err());
        assert!(batch.update::<Job>("job-1", &json!({"title": "x"})).is_ok());
        assert_eq!(batch.len(), 1);
    }
}
