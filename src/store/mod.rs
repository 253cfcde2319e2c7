//! Document store subsystem.
//!
//! # Data Flow
//! ```text
//! registry / comments / library
//!     → breaker.execute(|| store.find(..) / get / put / delete)
//!     → memory.rs (process-local, DashMap)
//!       or couch.rs (CouchDB-compatible HTTP API via reqwest)
//! ```
//!
//! # Design Decisions
//! - Consumers depend on four verbs only: get, put, delete, find-by-selector
//! - Documents are schemaless JSON objects carrying `_id` and `_rev`
//! - Store calls never retry on their own; callers route them through a breaker
//! - Rejected requests (conflicts, 4xx) are not outages: `settle` hands them
//!   back as a successful outcome so the breaker only counts real failures

pub mod couch;
pub mod memory;

use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use couch::CouchStore;
pub use memory::MemoryDocumentStore;

/// A stored JSON document.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";
pub const REV_FIELD: &str = "_rev";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("document conflict on {id}")]
    Conflict { id: String },

    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record did not serialize to a JSON object")]
    NotAnObject,

    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),
}

impl StoreError {
    /// The store refused this request; retrying it unchanged will not help.
    pub fn is_rejection(&self) -> bool {
        match self {
            StoreError::Conflict { .. } => true,
            StoreError::Status { status, .. } => (400..500).contains(status) && *status != 408 && *status != 429,
            _ => false,
        }
    }
}

/// Run a store call for a breaker: the outer error is a failure, the inner
/// one a rejected request.
pub async fn settle<T, Fut>(call: Fut) -> Result<Result<T, StoreError>, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    match call.await {
        Ok(value) => Ok(Ok(value)),
        Err(e) if e.is_rejection() => Ok(Err(e)),
        Err(e) => Err(e),
    }
}

/// Query over one database.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Every document.
    All,
    /// `field == value`.
    Eq { field: String, value: Value },
    /// Case-insensitive exact match of a string field.
    EqIgnoreCase { field: String, value: String },
}

impl Selector {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Selector::Eq { field: field.into(), value: value.into() }
    }

    pub fn eq_ignore_case(field: impl Into<String>, value: impl Into<String>) -> Self {
        Selector::EqIgnoreCase { field: field.into(), value: value.into() }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Selector::All => true,
            Selector::Eq { field, value } => doc.get(field) == Some(value),
            Selector::EqIgnoreCase { field, value } => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase() == value.to_lowercase()),
        }
    }

    /// Mango query selector (CouchDB `_find`).
    pub fn to_mango(&self) -> Value {
        match self {
            Selector::All => serde_json::json!({ ID_FIELD: { "$gt": null } }),
            Selector::Eq { field, value } => serde_json::json!({ field: value }),
            Selector::EqIgnoreCase { field, value } => {
                serde_json::json!({ field: { "$regex": format!("(?i)^{}$", regex::escape(value)) } })
            }
        }
    }
}

/// Minimal document database interface.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id; `None` if absent.
    async fn get(&self, db: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Insert (no `_id`) or update (with `_id` and current `_rev`) a document.
    /// Returns the stored document with its new `_id` and `_rev`.
    async fn put(&self, db: &str, doc: Document) -> Result<Document, StoreError>;

    /// Delete a document revision. Returns false if it did not exist.
    async fn delete(&self, db: &str, id: &str, rev: &str) -> Result<bool, StoreError>;

    /// Documents matching `selector`, at most `limit` of them.
    async fn find(&self, db: &str, selector: &Selector, limit: Option<usize>) -> Result<Vec<Document>, StoreError>;
}

pub fn doc_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

pub fn doc_rev(doc: &Document) -> Option<&str> {
    doc.get(REV_FIELD).and_then(Value::as_str)
}

/// Serialize a typed record into a document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

/// Deserialize a document into a typed record.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
