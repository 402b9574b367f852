use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::entity::{Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::patch::Patch;

/// Holds entities and applies patches to them.
///
/// Each `apply_patch` call is atomic: either every path in the patch is
/// written and the version is bumped, or nothing changes. Passing an
/// `expected_version` turns the write into a compare-and-swap.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch a snapshot of an entity.
    async fn get(&self, id: EntityId) -> CoreResult<Entity>;

    /// Apply `patch` to an entity and return its new version.
    async fn apply_patch(
        &self,
        id: EntityId,
        patch: &Patch,
        expected_version: Option<u64>,
    ) -> CoreResult<u64>;
}

/// An in-memory [`EntityStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<EntityId, Entity>,
    by_name_lower: HashMap<String, EntityId>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. Names are unique, case-insensitively.
    pub async fn insert(&self, entity: Entity) -> CoreResult<EntityId> {
        let mut inner = self.inner.write().await;
        let name_lower = entity.name.to_lowercase();
        if inner.by_name_lower.contains_key(&name_lower) {
            return Err(CoreError::DuplicateName(entity.name.clone()));
        }

        let id = entity.id;
        inner.by_name_lower.insert(name_lower, id);
        inner.entities.insert(id, entity);
        Ok(id)
    }

    /// Remove an entity and return it.
    pub async fn remove(&self, id: EntityId) -> CoreResult<Entity> {
        let mut inner = self.inner.write().await;
        let entity = inner
            .entities
            .remove(&id)
            .ok_or(CoreError::EntityNotFound(id))?;
        inner.by_name_lower.remove(&entity.name.to_lowercase());
        Ok(entity)
    }

    /// Find an entity by name (case-insensitive).
    pub async fn find_by_name(&self, name: &str) -> Option<Entity> {
        let inner = self.inner.read().await;
        inner
            .by_name_lower
            .get(&name.to_lowercase())
            .and_then(|id| inner.entities.get(id))
            .cloned()
    }

    /// Number of stored entities.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entities.len()
    }

    /// Returns true if the store holds no entities.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entities.is_empty()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, id: EntityId) -> CoreResult<Entity> {
        self.inner
            .read()
            .await
            .entities
            .get(&id)
            .cloned()
            .ok_or(CoreError::EntityNotFound(id))
    }

    async fn apply_patch(
        &self,
        id: EntityId,
        patch: &Patch,
        expected_version: Option<u64>,
    ) -> CoreResult<u64> {
        let mut inner = self.inner.write().await;
        let current = inner
            .entities
            .get(&id)
            .ok_or(CoreError::EntityNotFound(id))?;

        match expected_version {
            Some(expected) if expected != current.version => {
                return Err(CoreError::VersionConflict {
                    id,
                    expected,
                    found: current.version,
                });
            }
            _ => {}
        }

        let mut patched = patch.apply_to(current)?;
        let old_name = current.name.to_lowercase();
        let new_name = patched.name.to_lowercase();
        if new_name != old_name && inner.by_name_lower.contains_key(&new_name) {
            return Err(CoreError::DuplicateName(patched.name));
        }

        patched.version = current.version + 1;
        patched.updated_at = Utc::now();
        let version = patched.version;

        tracing::debug!(entity = %id, version, paths = patch.len(), "applied patch");

        if new_name != old_name {
            inner.by_name_lower.remove(&old_name);
            inner.by_name_lower.insert(new_name, id);
        }
        inner.entities.insert(id, patched);
        Ok(version)
    }
}
