//! In-memory document store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::store::{doc_id, doc_rev, Document, DocumentStore, Selector, StoreError, ID_FIELD, REV_FIELD};

/// Process-local store with CouchDB-style `_id`/`_rev` semantics.
///
/// Each database is a vector in insertion order, so `find` results are
/// stable. Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    dbs: Arc<DashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `db`.
    pub fn len(&self, db: &str) -> usize {
        self.dbs.get(db).map_or(0, |docs| docs.len())
    }

    pub fn is_empty(&self, db: &str) -> bool {
        self.len(db) == 0
    }
}

fn next_rev(current: Option<&str>) -> String {
    let generation = current
        .and_then(|rev| rev.split('-').next())
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-{}", generation + 1, Uuid::new_v4().simple())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, db: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .dbs
            .get(db)
            .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)).cloned()))
    }

    async fn put(&self, db: &str, mut doc: Document) -> Result<Document, StoreError> {
        let mut docs = self.dbs.entry(db.to_string()).or_default();

        let id = match doc_id(&doc) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };

        match docs.iter().position(|d| doc_id(d) == Some(id.as_str())) {
            Some(index) => {
                let current = doc_rev(&docs[index]);
                if doc_rev(&doc) != current {
                    return Err(StoreError::Conflict { id });
                }
                let rev = next_rev(current);
                doc.insert(REV_FIELD.to_string(), Value::String(rev));
                docs[index] = doc.clone();
            }
            None => {
                doc.insert(ID_FIELD.to_string(), Value::String(id));
                doc.insert(REV_FIELD.to_string(), Value::String(next_rev(None)));
                docs.push(doc.clone());
            }
        }

        Ok(doc)
    }

    async fn delete(&self, db: &str, id: &str, rev: &str) -> Result<bool, StoreError> {
        let Some(mut docs) = self.dbs.get_mut(db) else {
            return Ok(false);
        };
        let Some(index) = docs.iter().position(|d| doc_id(d) == Some(id)) else {
            return Ok(false);
        };
        if doc_rev(&docs[index]) != Some(rev) {
            return Err(StoreError::Conflict { id: id.to_string() });
        }
        docs.remove(index);
        Ok(true)
    }

    async fn find(&self, db: &str, selector: &Selector, limit: Option<usize>) -> Result<Vec<Document>, StoreError> {
        let Some(docs) = self.dbs.get(db) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|d| selector.matches(d))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
