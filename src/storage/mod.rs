//! Persistence seam of the pipeline: a minimal repository capability and an in-memory backend.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use dashmap::{DashMap, Entry};

use crate::domain::{AccountRecord, CustomerId, CustomerRecord};


#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// A record with the same key is already stored
    #[error("integrity conflict: {entity} with key {key} already exists")]
    IntegrityConflict { entity: &'static str, key: String },

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// A record that can be stored in a [`Repository`] under its own key.
pub trait Entity: Clone + Send + Sync {
    type Id: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync;

    /// Name used in error messages and logs.
    const NAME: &'static str;

    fn id(&self) -> Self::Id;
}

impl Entity for CustomerRecord {
    type Id = CustomerId;
    const NAME: &'static str = "customer";

    fn id(&self) -> CustomerId {
        self.customer_id
    }
}

impl Entity for AccountRecord {
    type Id = String;
    const NAME: &'static str = "account";

    fn id(&self) -> String {
        self.account_number.clone()
    }
}

/// Storage capability shared by all workers.
///
/// Implementations must be safe for concurrent access by key: the pipeline does not serialize
/// calls to the same repository.
pub trait Repository<V: Entity>: Send + Sync {
    /// Stores a new record. Fails with [`RepositoryError::IntegrityConflict`] if the key is taken.
    fn save(&self, record: V) -> Result<V, RepositoryError>;

    fn find_by_id(&self, id: &V::Id) -> Result<Option<V>, RepositoryError>;

    /// All stored records, ordered by key.
    fn find_all(&self) -> Result<Vec<V>, RepositoryError>;
}

impl<V: Entity, R: Repository<V> + ?Sized> Repository<V> for &R {
    fn save(&self, record: V) -> Result<V, RepositoryError> {
        (**self).save(record)
    }

    fn find_by_id(&self, id: &V::Id) -> Result<Option<V>, RepositoryError> {
        (**self).find_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<V>, RepositoryError> {
        (**self).find_all()
    }
}

/// DashMap-based repository, safe to share between worker threads.
/// Records are insert-only: a second save under the same key is an integrity conflict.
pub struct InMemoryRepository<V: Entity> {
    records: DashMap<V::Id, V>,
}

impl<V: Entity> InMemoryRepository<V> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<V: Entity> Default for InMemoryRepository<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Entity> Repository<V> for InMemoryRepository<V> {
    fn save(&self, record: V) -> Result<V, RepositoryError> {
        match self.records.entry(record.id()) {
            Entry::Occupied(e) => Err(RepositoryError::IntegrityConflict {
                entity: V::NAME,
                key: e.key().to_string(),
            }),
            Entry::Vacant(e) => {
                e.insert(record.clone());
                Ok(record)
            }
        }
    }

    fn find_by_id(&self, id: &V::Id) -> Result<Option<V>, RepositoryError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    fn find_all(&self) -> Result<Vec<V>, RepositoryError> {
        // DashMap iteration order is arbitrary; sort to keep exports deterministic
        let mut all: Vec<V> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|record| record.id());
        Ok(all)
    }
}
