//! Capability surface between the simulation and whatever draws it.
//!
//! The core only asks for things to happen: face this way, play that clip,
//! swap to the model for a new age. A renderer implements [`Creature`] for
//! its scene objects and [`Stage`] for its scene graph.

use serde::Serialize;

use crate::species::{AgeCategory, Gender, Species};

/// Behavioural and one-shot clips the simulation can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationTag {
    Idle,
    Walk,
    Peck,
    Lay,
    Die,
    Roll,
}

impl AnimationTag {
    /// Clips rolled for on the periodic behaviour tick, in weight order.
    pub const BEHAVIOURS: [AnimationTag; 3] =
        [AnimationTag::Idle, AnimationTag::Walk, AnimationTag::Peck];

    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationTag::Die | AnimationTag::Roll)
    }
}

/// Identifies which model a renderer should show for a bird.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModelKey {
    pub species: Species,
    pub age: AgeCategory,
    pub gender: Gender,
}

/// A renderable bound to one animal.
///
/// Calls are fire-and-forget. `swap_model` in particular may finish loading
/// several frames later; the simulation does not wait for it.
pub trait Creature {
    fn set_facing(&mut self, radians: f64);
    fn play(&mut self, clip: AnimationTag);
    fn swap_model(&mut self, model: ModelKey);
    fn despawn(&mut self);
}

/// The scene graph new birds are placed into.
pub trait Stage {
    fn spawn(&mut self, model: ModelKey) -> Box<dyn Creature>;
}

/// Binding used when nothing is drawn (CLI runs, server, tests).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Headless {
    pub facing: f64,
    pub clip: Option<AnimationTag>,
    pub model: Option<ModelKey>,
    pub despawned: bool,
}

impl Headless {
    pub fn new(model: ModelKey) -> Self {
        Self {
            model: Some(model),
            ..Self::default()
        }
    }
}

impl Creature for Headless {
    fn set_facing(&mut self, radians: f64) {
        self.facing = radians;
    }

    fn play(&mut self, clip: AnimationTag) {
        self.clip = Some(clip);
    }

    fn swap_model(&mut self, model: ModelKey) {
        self.model = Some(model);
    }

    fn despawn(&mut self) {
        self.despawned = true;
    }
}

#[derive(Debug, Default)]
pub struct HeadlessStage;

impl HeadlessStage {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for HeadlessStage {
    fn spawn(&mut self, model: ModelKey) -> Box<dyn Creature> {
        Box::new(Headless::new(model))
    }
}
