pub mod animal;
pub mod clock;
pub mod config;
pub mod creature;
pub mod economy;
pub mod engine;
pub mod farm;
pub mod registry;
pub mod rng;
pub mod species;
pub mod state;
pub mod web;

pub use animal::{Animal, AnimalSnapshot};
pub use config::{ConfigLoader, FarmConfig};
pub use economy::{Action, EconomyController, Outcome};
pub use engine::{GameLoop, GameLoopBuilder};
pub use farm::Farm;
pub use registry::{EntityId, EntityRegistry};
pub use species::{AgeCategory, Gender, Species};
pub use state::{GameState, Observer, StateChange};
