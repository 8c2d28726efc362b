//! Live simulated entities and the per-frame fan-out.

use std::collections::HashMap;
use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("entity id {0} is already registered")]
    DuplicateId(EntityId),
}

/// What an entity's update can reach besides itself.
pub struct TickContext<'a> {
    pub state: &'a mut GameState,
    pub rng: &'a mut dyn RngCore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    Active,
    /// The entity has finished and should leave the registry.
    Expired,
}

pub trait Entity {
    fn update(&mut self, dt: f64, ctx: &mut TickContext<'_>) -> EntityStatus;
}

pub struct EntityRegistry<E> {
    next_id: u64,
    entities: Vec<(EntityId, E)>,
    index: HashMap<EntityId, usize>,
}

impl<E> EntityRegistry<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn add(&mut self, entity: E) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.insert(id, entity);
        id
    }

    pub fn add_with_id(&mut self, entity: E, id: EntityId) -> Result<EntityId, RegistryError> {
        if self.index.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        self.insert(id, entity);
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.index.get(&id).map(|&slot| &self.entities[slot].1)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut E> {
        match self.index.get(&id) {
            Some(&slot) => Some(&mut self.entities[slot].1),
            None => None,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Removes the entity if present. Missing ids are not an error.
    pub fn remove(&mut self, id: EntityId) -> Option<E> {
        let slot = self.index.remove(&id)?;
        let (_, entity) = self.entities.swap_remove(slot);
        if let Some((moved, _)) = self.entities.get(slot) {
            self.index.insert(*moved, slot);
        }
        Some(entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|(id, _)| *id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &E)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    fn insert(&mut self, id: EntityId, entity: E) {
        self.index.insert(id, self.entities.len());
        self.entities.push((id, entity));
    }
}

impl<E: Entity> EntityRegistry<E> {
    /// Advances every entity once and removes those that expired, handing
    /// them back so the caller can tear down their renderables.
    pub fn update(&mut self, dt: f64, ctx: &mut TickContext<'_>) -> Vec<(EntityId, E)> {
        let mut expired = Vec::new();
        for (id, entity) in self.entities.iter_mut() {
            if entity.update(dt, ctx) == EntityStatus::Expired {
                expired.push(*id);
            }
        }
        expired
            .into_iter()
            .filter_map(|id| self.remove(id).map(|entity| (id, entity)))
            .collect()
    }
}

impl<E> Default for EntityRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
