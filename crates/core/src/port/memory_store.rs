// In-memory Entity Store adapter
//
// Used for ephemeral sessions and tests. The lock is never held across an await,
// so a commit is observed either entirely or not at all.

use crate::error::{AppError, Result};
use crate::port::entity_store::{
    merge_fields, Collection, EntityStore, IndexQuery, Record, WriteBatch, WriteOp,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct CollectionData {
    next_seq: u64,
    rows: BTreeMap<u64, Record>, // insertion sequence -> document
    by_id: HashMap<String, u64>,
}

impl CollectionData {
    fn get(&self, id: &str) -> Option<&Record> {
        self.by_id.get(id).and_then(|seq| self.rows.get(seq))
    }

    fn insert(&mut self, record: Record) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(record.id.clone(), seq);
        self.rows.insert(seq, record);
    }

    fn remove(&mut self, id: &str) {
        if let Some(seq) = self.by_id.remove(id) {
            self.rows.remove(&seq);
        }
    }
}

// Inverse of an applied write, replayed newest-first when a batch fails.
enum Undo {
    Remove(Collection, String),
    Restore(Collection, u64, Record),
}

#[derive(Default)]
pub struct MemoryEntityStore {
    collections: Mutex<HashMap<Collection, CollectionData>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Collection, CollectionData>>> {
        self.collections
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    fn apply(
        collections: &mut HashMap<Collection, CollectionData>,
        op: WriteOp,
        undo: &mut Vec<Undo>,
    ) -> Result<()> {
        match op {
            WriteOp::Add { collection, record } => {
                let data = collections.entry(collection).or_default();
                if data.by_id.contains_key(&record.id) {
                    return Err(AppError::DuplicateKey(format!(
                        "{} {}",
                        collection, record.id
                    )));
                }
                undo.push(Undo::Remove(collection, record.id.clone()));
                data.insert(record);
            }
            WriteOp::Put { collection, record } => {
                let data = collections.entry(collection).or_default();
                match data.by_id.get(&record.id).copied() {
                    Some(seq) => {
                        if let Some(old) = data.rows.insert(seq, record) {
                            undo.push(Undo::Restore(collection, seq, old));
                        }
                    }
                    None => {
                        undo.push(Undo::Remove(collection, record.id.clone()));
                        data.insert(record);
                    }
                }
            }
            WriteOp::Update {
                collection,
                id,
                fields,
            } => {
                let data = collections.entry(collection).or_default();
                let seq = data
                    .by_id
                    .get(&id)
                    .copied()
                    .ok_or_else(|| AppError::NotFound(format!("{} {}", collection, id)))?;
                if let Some(record) = data.rows.get_mut(&seq) {
                    undo.push(Undo::Restore(collection, seq, record.clone()));
                    merge_fields(&mut record.body, &fields);
                }
            }
        }
        Ok(())
    }

    fn rollback(collections: &mut HashMap<Collection, CollectionData>, undo: Vec<Undo>) {
        for step in undo.into_iter().rev() {
            match step {
                Undo::Remove(collection, id) => {
                    if let Some(data) = collections.get_mut(&collection) {
                        data.remove(&id);
                    }
                }
                Undo::Restore(collection, seq, record) => {
                    if let Some(data) = collections.get_mut(&collection) {
                        data.rows.insert(seq, record);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let collections = self.lock()?;
        Ok(collections
            .get(&collection)
            .and_then(|data| data.get(id))
            .cloned())
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<Record>> {
        let collections = self.lock()?;
        Ok(collections
            .get(&collection)
            .map(|data| data.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn lookup(&self, collection: Collection, query: &IndexQuery) -> Result<Vec<Record>> {
        let collections = self.lock()?;
        Ok(collections
            .get(&collection)
            .map(|data| {
                data.rows
                    .values()
                    .filter(|record| query.matches(record.index_key(collection).as_ref()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let collections = self.lock()?;
        Ok(collections
            .get(&collection)
            .map(|data| data.rows.len())
            .unwrap_or(0))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut collections = self.lock()?;
        let mut undo = Vec::with_capacity(batch.len());

        for op in batch.into_ops() {
            if let Err(e) = Self::apply(&mut collections, op, &mut undo) {
                Self::rollback(&mut collections, undo);
                return Err(e);
            }
        }
        Ok(())
    }
}
