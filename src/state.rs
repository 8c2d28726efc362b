//! The farm's economic counters and the observers that mirror them.
//!
//! Setters store and broadcast; they never validate. Deciding whether a
//! change is allowed is the economy controller's job.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::animal::AnimalSnapshot;
use crate::species::Species;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum StateChange {
    Money { value: u64 },
    Food { value: u64 },
    Eggs { species: Species, value: u64 },
    PoultryCount { value: u64 },
}

/// Listener for store mutations (HUD, shop, popups).
pub trait Observer {
    fn state_changed(&mut self, change: &StateChange);

    fn animal_changed(&mut self, _snapshot: &AnimalSnapshot) {}
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    fn state_changed(&mut self, change: &StateChange) {
        (**self).state_changed(change);
    }

    fn animal_changed(&mut self, snapshot: &AnimalSnapshot) {
        (**self).animal_changed(snapshot);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub money: u64,
    pub food: u64,
    pub eggs: BTreeMap<Species, u64>,
    pub poultry_count: u64,
}

#[derive(Default)]
pub struct GameState {
    counters: Counters,
    observers: Vec<Box<dyn Observer>>,
}

impl GameState {
    pub fn new(money: u64, food: u64) -> Self {
        let mut counters = Counters {
            money,
            food,
            ..Counters::default()
        };
        for species in Species::ALL {
            counters.eggs.insert(species, 0);
        }
        Self {
            counters,
            observers: Vec::new(),
        }
    }

    /// Adds an observer and replays the current counters to it, so a
    /// freshly attached HUD starts in sync.
    pub fn subscribe(&mut self, observer: impl Observer + 'static) {
        let mut observer = Box::new(observer);
        for change in self.current_values() {
            observer.state_changed(&change);
        }
        self.observers.push(observer);
    }

    fn current_values(&self) -> Vec<StateChange> {
        let mut changes = vec![
            StateChange::Money {
                value: self.counters.money,
            },
            StateChange::Food {
                value: self.counters.food,
            },
        ];
        for species in Species::ALL {
            changes.push(StateChange::Eggs {
                species,
                value: self.eggs(species),
            });
        }
        changes.push(StateChange::PoultryCount {
            value: self.counters.poultry_count,
        });
        changes
    }

    pub fn money(&self) -> u64 {
        self.counters.money
    }

    pub fn food(&self) -> u64 {
        self.counters.food
    }

    pub fn eggs(&self, species: Species) -> u64 {
        self.counters.eggs.get(&species).copied().unwrap_or(0)
    }

    pub fn poultry_count(&self) -> u64 {
        self.counters.poultry_count
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn set_money(&mut self, value: u64) {
        self.counters.money = value;
        self.notify(StateChange::Money { value });
    }

    pub fn set_food(&mut self, value: u64) {
        self.counters.food = value;
        self.notify(StateChange::Food { value });
    }

    pub fn set_eggs(&mut self, species: Species, value: u64) {
        self.counters.eggs.insert(species, value);
        self.notify(StateChange::Eggs { species, value });
    }

    pub fn set_poultry_count(&mut self, value: u64) {
        self.counters.poultry_count = value;
        self.notify(StateChange::PoultryCount { value });
    }

    /// Credits one egg laid by a bird of `species`.
    pub fn deposit_egg(&mut self, species: Species) {
        let value = self.eggs(species).saturating_add(1);
        self.set_eggs(species, value);
    }

    pub fn publish_animal(&mut self, snapshot: &AnimalSnapshot) {
        for observer in &mut self.observers {
            observer.animal_changed(snapshot);
        }
    }

    fn notify(&mut self, change: StateChange) {
        for observer in &mut self.observers {
            observer.state_changed(&change);
        }
    }
}
