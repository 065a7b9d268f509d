use std::collections::BTreeMap;

use super::domain::{Entity, EntityId, FactField, FactValue};
use super::FilingError;

/// In-memory fact rows keyed by entity id.
///
/// Every write replaces the whole row, so flags from an earlier row never leak into a later
/// classification.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    rows: BTreeMap<EntityId, Entity>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `entity`, returning the row it replaced.
    ///
    /// A rejected row leaves any previous row for the same id untouched.
    pub fn set_facts(&mut self, entity: Entity) -> Result<Option<Entity>, FilingError> {
        entity.validate()?;
        Ok(self.rows.insert(entity.id.clone(), entity))
    }

    /// Parse string-typed fields into a row and store it.
    pub fn set_fields<I, K, V>(
        &mut self,
        entity_id: &EntityId,
        fields: I,
    ) -> Result<Option<Entity>, FilingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entity = Entity::from_fields(entity_id.as_str(), fields)?;
        self.set_facts(entity)
    }

    pub fn row(&self, entity_id: &EntityId) -> Result<&Entity, FilingError> {
        self.rows
            .get(entity_id)
            .ok_or_else(|| FilingError::UnknownEntity(entity_id.clone()))
    }

    pub fn get(&self, entity_id: &EntityId, field: FactField) -> Result<FactValue, FilingError> {
        Ok(self.row(entity_id)?.get(field))
    }

    /// All facts of a row rendered as strings, keyed by field key.
    pub fn properties(&self, entity_id: &EntityId) -> Result<BTreeMap<String, String>, FilingError> {
        let entity = self.row(entity_id)?;
        Ok(FactField::ordered()
            .into_iter()
            .map(|field| (field.key().to_string(), entity.get(field).to_string()))
            .collect())
    }

    pub fn remove(&mut self, entity_id: &EntityId) -> Result<Entity, FilingError> {
        self.rows
            .remove(entity_id)
            .ok_or_else(|| FilingError::UnknownEntity(entity_id.clone()))
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.rows.keys().cloned().collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Entity> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
