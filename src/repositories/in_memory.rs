use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Aggregate, Repository};
use crate::errors::ServiceError;

/// Process-local repository backed by a [`DashMap`]. Unique keys are held
/// in a second map and claimed before the aggregate is inserted.
#[derive(Debug)]
pub struct InMemoryRepository<T: Aggregate> {
    items: DashMap<Uuid, T>,
    unique_keys: DashMap<String, Uuid>,
}

impl<T: Aggregate> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Aggregate> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            unique_keys: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<T: Aggregate> Repository<T> for InMemoryRepository<T> {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>, ServiceError> {
        Ok(self.items.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self.items.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn add(&self, aggregate: T) -> Result<T, ServiceError> {
        let id = aggregate.id();
        let key = aggregate.unique_key();
        if let Some(key) = &key {
            match self.unique_keys.entry(key.clone()) {
                Entry::Occupied(_) => {
                    return Err(ServiceError::AlreadyExists(format!(
                        "{} with {} already exists",
                        T::NAME,
                        key
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        match self.items.entry(id) {
            Entry::Occupied(_) => {
                if let Some(key) = &key {
                    self.unique_keys.remove(key);
                }
                return Err(ServiceError::InvalidOperation(format!(
                    "{} {} already exists",
                    T::NAME,
                    id
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(aggregate.clone());
            }
        }
        debug!(aggregate = T::NAME, %id, "Aggregate added");
        Ok(aggregate)
    }

    async fn update(&self, aggregate: T) -> Result<T, ServiceError> {
        let id = aggregate.id();
        let mut stored = self
            .items
            .get_mut(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", T::NAME, id)))?;

        if stored.version() != aggregate.version() {
            warn!(
                aggregate = T::NAME,
                %id,
                expected = aggregate.version(),
                actual = stored.version(),
                "Concurrent modification detected"
            );
            return Err(ServiceError::ConcurrentModification(id));
        }

        let mut next = aggregate;
        next.set_version(stored.version() + 1);
        *stored = next.clone();
        debug!(aggregate = T::NAME, %id, version = next.version(), "Aggregate updated");
        Ok(next)
    }
}
