//! Flag persistence backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::registry::flags::{FlagStatus, ServiceFlag};
use crate::registry::RegistryError;
use crate::resilience::CircuitBreaker;
use crate::store::{from_document, settle, to_document, DocumentStore, Selector};

const NAME_FIELD: &str = "service_name";

/// The three verbs the registry needs from its database.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Flag whose name matches `name` case-insensitively.
    async fn find_by_name(&self, name: &str) -> Result<Option<ServiceFlag>, RegistryError>;

    /// Persist `status` on an existing flag; `None` if there is no such flag.
    async fn write(&self, name: &str, status: FlagStatus) -> Result<Option<ServiceFlag>, RegistryError>;

    /// Current status of `name`; `None` if there is no such flag.
    async fn read(&self, name: &str) -> Result<Option<FlagStatus>, RegistryError> {
        Ok(self.find_by_name(name).await?.map(|flag| flag.status))
    }
}

/// [`FlagStore`] over a generic document database.
///
/// Every store call goes through a dedicated breaker. That breaker carries
/// no flag effects, since a registry outage cannot be reported through the
/// registry itself.
pub struct DocumentFlagStore {
    store: Arc<dyn DocumentStore>,
    db: String,
    breaker: CircuitBreaker,
}

impl DocumentFlagStore {
    pub fn new(store: Arc<dyn DocumentStore>, db: impl Into<String>, breaker: CircuitBreaker) -> Self {
        Self { store, db: db.into(), breaker }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Create any missing flag documents with `status`. Existing flags are
    /// left untouched. Returns how many were created.
    pub async fn seed(&self, names: &[String], status: FlagStatus) -> Result<usize, RegistryError> {
        let mut created = 0;
        for name in names {
            if self.find_by_name(name).await?.is_some() {
                continue;
            }
            let doc = to_document(&ServiceFlag::new(name.clone(), status))?;
            let (store, db) = (&self.store, self.db.as_str());
            self.breaker.execute(move || settle(store.put(db, doc.clone()))).await??;
            created += 1;
        }
        Ok(created)
    }
}

#[async_trait]
impl FlagStore for DocumentFlagStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<ServiceFlag>, RegistryError> {
        let selector = Selector::eq_ignore_case(NAME_FIELD, name);
        let (store, db, selector) = (&self.store, self.db.as_str(), &selector);
        let docs = self.breaker.execute(move || settle(store.find(db, selector, Some(1)))).await??;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, name: &str, status: FlagStatus) -> Result<Option<ServiceFlag>, RegistryError> {
        let Some(mut flag) = self.find_by_name(name).await? else {
            tracing::error!(service = %name, "Microservice not found");
            return Ok(None);
        };
        flag.status = status;

        let doc = to_document(&flag)?;
        let (store, db) = (&self.store, self.db.as_str());
        let stored = self.breaker.execute(move || settle(store.put(db, doc.clone()))).await??;
        Ok(Some(from_document(stored)?))
    }
}
