use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use super::domain::{Entity, EntityId, FilingStatus};
use super::engine::{FilingEngine, Verdict};
use super::facts::FactStore;
use super::rules::RuleDescriptor;
use super::FilingError;

/// Shared facade over the fact store and the classifier.
///
/// Writes take the store lock exclusively, so a row is never read while it is being replaced.
#[derive(Debug, Default)]
pub struct FilingService {
    store: RwLock<FactStore>,
    engine: FilingEngine,
}

impl FilingService {
    pub fn new(engine: FilingEngine) -> Self {
        Self {
            store: RwLock::new(FactStore::new()),
            engine,
        }
    }

    pub fn engine(&self) -> &FilingEngine {
        &self.engine
    }

    /// Replace the facts for `entity.id`, returning the previous row if any.
    pub fn set_facts(&self, entity: Entity) -> Result<Option<Entity>, FilingError> {
        let entity_id = entity.id.clone();
        let result = self.write()?.set_facts(entity);
        match &result {
            Ok(previous) => info!(
                entity = %entity_id,
                replaced = previous.is_some(),
                "stored filing facts"
            ),
            Err(err) => warn!(entity = %entity_id, error = %err, "rejected filing facts"),
        }
        result
    }

    pub fn set_fields<I, K, V>(
        &self,
        entity_id: &EntityId,
        fields: I,
    ) -> Result<Option<Entity>, FilingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entity = Entity::from_fields(entity_id.as_str(), fields).inspect_err(|err| {
            warn!(entity = %entity_id, error = %err, "rejected filing facts");
        })?;
        self.set_facts(entity)
    }

    pub fn classify(&self, entity_id: &EntityId) -> Result<Verdict, FilingError> {
        let store = self.read()?;
        self.engine.classify(&store, entity_id)
    }

    /// Classify every stored entity in id order.
    pub fn classify_all(&self) -> Result<Vec<Verdict>, FilingError> {
        let store = self.read()?;
        Ok(store.rows().map(|entity| self.engine.evaluate(entity)).collect())
    }

    pub fn entities_with_status(&self, status: FilingStatus) -> Result<Vec<EntityId>, FilingError> {
        Ok(self
            .classify_all()?
            .into_iter()
            .filter(|verdict| verdict.obligation.status() == status)
            .map(|verdict| verdict.entity_id)
            .collect())
    }

    pub fn row(&self, entity_id: &EntityId) -> Result<Entity, FilingError> {
        Ok(self.read()?.row(entity_id)?.clone())
    }

    pub fn properties(&self, entity_id: &EntityId) -> Result<BTreeMap<String, String>, FilingError> {
        self.read()?.properties(entity_id)
    }

    pub fn entity_ids(&self) -> Result<Vec<EntityId>, FilingError> {
        Ok(self.read()?.entity_ids())
    }

    pub fn remove(&self, entity_id: &EntityId) -> Result<Entity, FilingError> {
        let removed = self.write()?.remove(entity_id)?;
        info!(entity = %entity_id, "removed filing facts");
        Ok(removed)
    }

    pub fn rules(&self) -> Vec<RuleDescriptor> {
        self.engine.rules().catalog()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, FactStore>, FilingError> {
        self.store.read().map_err(|_| FilingError::StoreUnavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, FactStore>, FilingError> {
        self.store.write().map_err(|_| FilingError::StoreUnavailable)
    }
}
