use rand::Rng;
use serde::Serialize;

use crate::animal::{Animal, AnimalSnapshot};
use crate::config::{FarmConfig, LifecycleConfig};
use crate::creature::{ModelKey, Stage};
use crate::registry::{EntityId, EntityRegistry, TickContext};
use crate::rng::{RngManager, FLOCK_STREAM, HATCHERY_STREAM};
use crate::species::{AgeCategory, Gender, Species};
use crate::state::{Counters, GameState, Observer};

/// Everything the simulation owns: the flock, the store, the random
/// streams and the stage new birds are placed on.
pub struct Farm {
    pub(crate) state: GameState,
    pub(crate) registry: EntityRegistry<Animal>,
    rng: RngManager,
    stage: Box<dyn Stage>,
    lifecycle: LifecycleConfig,
    inspected: Option<EntityId>,
    elapsed_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmSnapshot {
    pub elapsed_secs: f64,
    pub counters: Counters,
    pub animals: Vec<AnimalSnapshot>,
}

impl Farm {
    pub fn new(state: GameState, stage: Box<dyn Stage>, lifecycle: LifecycleConfig, seed: u64) -> Self {
        Self {
            state,
            registry: EntityRegistry::new(),
            rng: RngManager::new(seed),
            stage,
            lifecycle,
            inspected: None,
            elapsed_secs: 0.0,
        }
    }

    /// Builds the opening farm described by `config`, including its flock.
    pub fn from_config(config: &FarmConfig, stage: Box<dyn Stage>) -> Self {
        let mut state = GameState::new(config.starting_money, config.starting_food);
        for (species, count) in &config.starting_eggs {
            state.set_eggs(*species, *count);
        }
        let mut farm = Self::new(state, stage, config.lifecycle, config.seed);
        for entry in &config.flock {
            for _ in 0..entry.count {
                farm.spawn(entry.species, entry.gender, entry.age_minutes);
            }
        }
        farm
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) {
        self.state.subscribe(observer);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn animal(&self, id: EntityId) -> Option<&Animal> {
        self.registry.get(id)
    }

    pub fn animal_mut(&mut self, id: EntityId) -> Option<&mut Animal> {
        self.registry.get_mut(id)
    }

    pub fn animal_ids(&self) -> Vec<EntityId> {
        self.registry.ids()
    }

    pub fn animals(&self) -> impl Iterator<Item = (EntityId, &Animal)> {
        self.registry.iter()
    }

    pub fn living_count(&self) -> u64 {
        self.registry.iter().filter(|(_, a)| !a.is_dead()).count() as u64
    }

    /// Places a new bird on the stage and registers it. A missing gender
    /// is rolled from the hatchery stream.
    pub fn spawn(&mut self, species: Species, gender: Option<Gender>, age_minutes: u32) -> EntityId {
        let gender = gender.unwrap_or_else(|| {
            if self.rng.stream(HATCHERY_STREAM).gen_bool(0.5) {
                Gender::Female
            } else {
                Gender::Male
            }
        });
        let creature = self.stage.spawn(ModelKey {
            species,
            age: AgeCategory::Child,
            gender,
        });
        let animal = Animal::new(species, gender, creature, self.lifecycle).with_age_minutes(age_minutes);
        let id = self.registry.add(animal);
        tracing::info!(%id, %species, ?gender, "bird joined the flock");
        self.sync_poultry_count();
        id
    }

    /// Selects the bird whose stats are pushed to observers each frame.
    pub fn inspect(&mut self, id: Option<EntityId>) {
        self.inspected = id;
        self.publish_inspected();
    }

    pub fn inspected(&self) -> Option<EntityId> {
        self.inspected
    }

    /// Runs one simulation step over the whole flock.
    pub fn advance(&mut self, dt: f64) {
        self.elapsed_secs += dt;
        let mut flock_rng = self.rng.stream(FLOCK_STREAM);
        let mut ctx = TickContext {
            state: &mut self.state,
            rng: &mut flock_rng,
        };
        let expired = self.registry.update(dt, &mut ctx);
        for (id, mut animal) in expired {
            animal.despawn();
            tracing::debug!(%id, "removed from registry");
            if self.inspected == Some(id) {
                self.inspected = None;
            }
        }
        self.sync_poultry_count();
        self.publish_inspected();
    }

    pub fn snapshot(&self) -> FarmSnapshot {
        let mut animals: Vec<AnimalSnapshot> = self
            .registry
            .iter()
            .map(|(id, animal)| animal.snapshot(id))
            .collect();
        animals.sort_by_key(|a| a.id);
        FarmSnapshot {
            elapsed_secs: self.elapsed_secs,
            counters: self.state.counters().clone(),
            animals,
        }
    }

    /// Keeps the store's poultry count equal to the number of living birds.
    /// Only notifies when the value actually moved.
    pub(crate) fn sync_poultry_count(&mut self) {
        let living = self.living_count();
        if living != self.state.poultry_count() {
            self.state.set_poultry_count(living);
        }
    }

    fn publish_inspected(&mut self) {
        let Some(id) = self.inspected else {
            return;
        };
        if let Some(animal) = self.registry.get(id) {
            let snapshot = animal.snapshot(id);
            self.state.publish_animal(&snapshot);
        }
    }
}
