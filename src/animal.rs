//! Lifecycle of a single bird.
//!
//! Time is consumed in whole simulated seconds: frame deltas pile up in an
//! accumulator and every full second runs one step, so variable frame rates
//! never skip or double a periodic check.

use std::f64::consts::TAU;

use rand::{Rng, RngCore};
use serde::Serialize;

use crate::config::LifecycleConfig;
use crate::creature::{AnimationTag, Creature, ModelKey};
use crate::registry::{Entity, EntityId, EntityStatus, TickContext};
use crate::rng::RngExt;
use crate::species::{weight_for, AgeCategory, Gender, Species};
use crate::state::GameState;

pub const STAT_MAX: u8 = 100;
const SECONDS_PER_AGE_MINUTE: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cause {
    /// Health ran out.
    Natural,
    /// The player sold the bird.
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fate {
    cause: Cause,
    removal_in: f64,
}

/// Stats shown in the bird's popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimalSnapshot {
    pub id: EntityId,
    pub species: Species,
    pub gender: Gender,
    pub age_minutes: u32,
    pub age: AgeCategory,
    pub food: u8,
    pub care: u8,
    pub health: u8,
    pub weight: f64,
    pub is_egg_layer: bool,
    pub is_dead: bool,
    pub animation: AnimationTag,
}

pub struct Animal {
    species: Species,
    gender: Gender,
    age_minutes: u32,
    age: AgeCategory,
    food: u8,
    care: u8,
    health: u8,
    weight: f64,
    is_egg_layer: bool,
    fate: Option<Fate>,
    accumulator: f64,
    elapsed_seconds: u64,
    grace_left: u32,
    fed_cooldown: u32,
    eggs_laid: u32,
    animation: AnimationTag,
    facing: f64,
    lifecycle: LifecycleConfig,
    creature: Box<dyn Creature>,
}

impl Animal {
    pub fn new(
        species: Species,
        gender: Gender,
        creature: Box<dyn Creature>,
        lifecycle: LifecycleConfig,
    ) -> Self {
        let mut animal = Self {
            species,
            gender,
            age_minutes: 0,
            age: AgeCategory::Child,
            food: STAT_MAX,
            care: STAT_MAX,
            health: STAT_MAX,
            weight: species.child_weight(),
            is_egg_layer: false,
            fate: None,
            accumulator: 0.0,
            elapsed_seconds: 0,
            grace_left: lifecycle.starvation_grace_secs,
            fed_cooldown: 0,
            eggs_laid: 0,
            animation: AnimationTag::Idle,
            facing: 0.0,
            lifecycle,
            creature,
        };
        animal.creature.play(AnimationTag::Idle);
        animal
    }

    /// Starts the bird at a given age, used for initial stocking.
    pub fn with_age_minutes(mut self, minutes: u32) -> Self {
        self.elapsed_seconds = u64::from(minutes) * SECONDS_PER_AGE_MINUTE;
        self.age_minutes = minutes;
        let category = AgeCategory::from_age_minutes(minutes);
        if category != self.age {
            self.age = category;
            self.creature.swap_model(self.model_key());
        }
        self.recompute_weight();
        self.recompute_egg_layer();
        self
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age_minutes(&self) -> u32 {
        self.age_minutes
    }

    pub fn age(&self) -> AgeCategory {
        self.age
    }

    pub fn food(&self) -> u8 {
        self.food
    }

    pub fn care(&self) -> u8 {
        self.care
    }

    pub fn health(&self) -> u8 {
        self.health
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_egg_layer(&self) -> bool {
        self.is_egg_layer
    }

    pub fn is_dead(&self) -> bool {
        self.fate.is_some()
    }

    pub fn cause_of_death(&self) -> Option<Cause> {
        self.fate.map(|fate| fate.cause)
    }

    pub fn eggs_laid(&self) -> u32 {
        self.eggs_laid
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn animation(&self) -> AnimationTag {
        self.animation
    }

    pub fn facing(&self) -> f64 {
        self.facing
    }

    pub fn model_key(&self) -> ModelKey {
        ModelKey {
            species: self.species,
            age: self.age,
            gender: self.gender,
        }
    }

    pub fn snapshot(&self, id: EntityId) -> AnimalSnapshot {
        AnimalSnapshot {
            id,
            species: self.species,
            gender: self.gender,
            age_minutes: self.age_minutes,
            age: self.age,
            food: self.food,
            care: self.care,
            health: self.health,
            weight: self.weight,
            is_egg_layer: self.is_egg_layer,
            is_dead: self.is_dead(),
            animation: self.animation,
        }
    }

    /// Adds up to `amount` food without overfilling and returns how much
    /// was taken. Dead birds take nothing.
    pub fn feed(&mut self, amount: u8) -> u8 {
        if self.is_dead() {
            return 0;
        }
        let delta = amount.min(STAT_MAX - self.food);
        if delta > 0 {
            self.food += delta;
            self.fed_cooldown = self.lifecycle.feed_cooldown_secs;
        }
        delta
    }

    /// Overrides the food stat for scripted scenarios.
    pub fn set_food(&mut self, food: u8) {
        if !self.is_dead() {
            self.food = food.min(STAT_MAX);
        }
    }

    pub fn die(&mut self) {
        self.finish(Cause::Natural, AnimationTag::Die, self.lifecycle.death_removal_secs);
    }

    pub fn sell(&mut self) {
        self.finish(Cause::Sold, AnimationTag::Roll, self.lifecycle.sale_removal_secs);
    }

    pub(crate) fn despawn(&mut self) {
        self.creature.despawn();
    }

    fn finish(&mut self, cause: Cause, clip: AnimationTag, removal_in: f64) {
        if self.is_dead() {
            return;
        }
        self.fate = Some(Fate { cause, removal_in });
        self.is_egg_layer = false;
        self.request_animation(clip);
        tracing::info!(
            species = %self.species,
            age = %self.age,
            ?cause,
            "bird left the flock"
        );
    }

    fn step_second(&mut self, ctx: &mut TickContext<'_>) {
        self.elapsed_seconds += 1;
        let second = self.elapsed_seconds;
        let every = |interval: u32| interval > 0 && second % u64::from(interval) == 0;

        self.apply_starvation();
        if self.food > 0 && self.health < STAT_MAX && self.age != AgeCategory::Old {
            self.health += 1;
        }
        if self.age == AgeCategory::Old {
            let chance = self.lifecycle.senescence_chance.clamp(0.0, 1.0);
            if ctx.rng.gen_bool(chance) {
                self.health = self.health.saturating_sub(1);
            }
        }
        if self.health == 0 {
            self.die();
            return;
        }

        if every(self.lifecycle.food_decay_secs) && self.fed_cooldown == 0 {
            self.food = self.food.saturating_sub(1);
        }
        self.fed_cooldown = self.fed_cooldown.saturating_sub(1);

        if every(self.lifecycle.care_interval_secs) {
            let blended = (u16::from(self.care) + u16::from(self.food) + 1) / 2;
            self.care = blended.min(u16::from(STAT_MAX)) as u8;
            self.recompute_weight();
        }

        if every(self.lifecycle.behaviour_interval_secs) {
            self.pick_behaviour(ctx.rng);
        }

        if every(self.lifecycle.egg_interval_secs) {
            self.recompute_egg_layer();
            if self.is_egg_layer {
                self.lay_egg(ctx.state);
            }
        }

        if second % SECONDS_PER_AGE_MINUTE == 0 {
            self.age_minutes = (second / SECONDS_PER_AGE_MINUTE) as u32;
            let category = AgeCategory::from_age_minutes(self.age_minutes);
            if category > self.age {
                self.promote(category);
            }
        }
    }

    fn apply_starvation(&mut self) {
        if self.food > 0 {
            self.grace_left = self.lifecycle.starvation_grace_secs;
            return;
        }
        self.grace_left = self.grace_left.saturating_sub(1);
        if self.grace_left == 0 {
            self.health = self.health.saturating_sub(1);
            self.grace_left = self.lifecycle.starvation_grace_secs;
        }
    }

    fn promote(&mut self, category: AgeCategory) {
        tracing::debug!(species = %self.species, from = %self.age, to = %category, "bird grew up");
        self.age = category;
        self.recompute_weight();
        self.recompute_egg_layer();
        self.creature.swap_model(self.model_key());
    }

    fn recompute_weight(&mut self) {
        self.weight = weight_for(self.species, self.age, self.gender, self.food);
    }

    fn recompute_egg_layer(&mut self) {
        self.is_egg_layer =
            self.age == AgeCategory::Adult && self.gender == Gender::Female && self.care > 50;
    }

    fn lay_egg(&mut self, state: &mut GameState) {
        state.deposit_egg(self.species);
        self.eggs_laid += 1;
        self.request_animation(AnimationTag::Lay);
    }

    fn pick_behaviour(&mut self, rng: &mut dyn RngCore) {
        let weights = self.lifecycle.behaviour_weights;
        let clip = AnimationTag::BEHAVIOURS[rng.pick_weighted(&weights)];
        self.facing = rng.gen::<f64>() * TAU;
        self.creature.set_facing(self.facing);
        tracing::trace!(?clip, facing = self.facing, "behaviour pick");
        self.request_animation(clip);
    }

    fn request_animation(&mut self, clip: AnimationTag) {
        self.animation = clip;
        self.creature.play(clip);
    }
}

impl Entity for Animal {
    fn update(&mut self, dt: f64, ctx: &mut TickContext<'_>) -> EntityStatus {
        if let Some(fate) = self.fate.as_mut() {
            fate.removal_in -= dt;
            // NaN counts as elapsed.
            return if !(fate.removal_in > 0.0) {
                EntityStatus::Expired
            } else {
                EntityStatus::Active
            };
        }

        self.accumulator += dt.max(0.0);
        while self.accumulator >= 1.0 {
            self.accumulator -= 1.0;
            self.step_second(ctx);
            if self.is_dead() {
                self.accumulator = 0.0;
                break;
            }
        }
        EntityStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::creature::Headless;
    use crate::rng::RngManager;

    /// Lets a test look at the binding after handing it to the bird.
    struct Shared(Rc<RefCell<Headless>>);

    impl Creature for Shared {
        fn set_facing(&mut self, radians: f64) {
            self.0.borrow_mut().set_facing(radians);
        }

        fn play(&mut self, clip: AnimationTag) {
            self.0.borrow_mut().play(clip);
        }

        fn swap_model(&mut self, model: ModelKey) {
            self.0.borrow_mut().swap_model(model);
        }

        fn despawn(&mut self) {
            self.0.borrow_mut().despawn();
        }
    }

    fn hen() -> Animal {
        Animal::new(
            Species::Chicken,
            Gender::Female,
            Box::new(Headless::default()),
            LifecycleConfig::default(),
        )
    }

    fn run_seconds(animal: &mut Animal, state: &mut GameState, seconds: u32) -> EntityStatus {
        let mut rng = RngManager::new(3);
        let mut stream = rng.stream("test");
        let mut ctx = TickContext {
            state,
            rng: &mut stream,
        };
        let mut status = EntityStatus::Active;
        for _ in 0..seconds {
            status = animal.update(1.0, &mut ctx);
            if status == EntityStatus::Expired {
                break;
            }
        }
        status
    }

    #[test]
    fn feed_caps_at_full() {
        let mut bird = hen();
        bird.set_food(95);
        assert_eq!(bird.feed(10), 5);
        assert_eq!(bird.food(), 100);
        assert_eq!(bird.feed(10), 0);
    }

    #[test]
    fn sub_second_frames_accumulate() {
        let mut bird = hen();
        let mut state = GameState::default();
        let mut rng = RngManager::new(3);
        let mut stream = rng.stream("test");
        let mut ctx = TickContext {
            state: &mut state,
            rng: &mut stream,
        };
        for _ in 0..9 {
            bird.update(0.25, &mut ctx);
        }
        assert_eq!(bird.elapsed_seconds(), 2);
    }

    #[test]
    fn food_decays_every_other_second_unless_fed() {
        let mut bird = hen();
        let mut state = GameState::default();
        run_seconds(&mut bird, &mut state, 4);
        assert_eq!(bird.food(), 98);

        bird.set_food(50);
        bird.feed(1);
        run_seconds(&mut bird, &mut state, 2);
        assert_eq!(bird.food(), 51);
    }

    #[test]
    fn hen_lays_once_adult() {
        let mut bird = hen().with_age_minutes(3);
        let mut state = GameState::default();
        assert!(bird.is_egg_layer());
        run_seconds(&mut bird, &mut state, 30);
        assert_eq!(state.eggs(Species::Chicken), 1);
        assert_eq!(bird.eggs_laid(), 1);
    }

    #[test]
    fn roosters_never_lay() {
        let mut bird = Animal::new(
            Species::Chicken,
            Gender::Male,
            Box::new(Headless::default()),
            LifecycleConfig::default(),
        )
        .with_age_minutes(4);
        let mut state = GameState::default();
        run_seconds(&mut bird, &mut state, 60);
        assert!(!bird.is_egg_layer());
        assert_eq!(state.eggs(Species::Chicken), 0);
    }

    #[test]
    fn selling_is_terminal_and_expires_after_delay() {
        let mut bird = hen();
        let mut state = GameState::default();
        bird.sell();
        bird.sell();
        assert_eq!(bird.cause_of_death(), Some(Cause::Sold));
        assert_eq!(bird.animation(), AnimationTag::Roll);
        assert_eq!(bird.feed(10), 0);

        let food = bird.food();
        let status = run_seconds(&mut bird, &mut state, 1);
        assert_eq!(status, EntityStatus::Expired);
        assert_eq!(bird.food(), food);
        assert_eq!(bird.elapsed_seconds(), 0);
    }

    #[test]
    fn promotion_swaps_model_and_rechecks_laying() {
        let mut bird = hen().with_age_minutes(2);
        let mut state = GameState::default();
        assert_eq!(bird.age(), AgeCategory::Child);
        assert!(!bird.is_egg_layer());
        run_seconds(&mut bird, &mut state, 60);
        assert_eq!(bird.age_minutes(), 3);
        assert_eq!(bird.age(), AgeCategory::Adult);
        assert!(bird.is_egg_layer());
    }

    #[test]
    fn old_birds_do_not_regenerate() {
        let mut bird = hen().with_age_minutes(11);
        let mut state = GameState::default();
        assert_eq!(bird.age(), AgeCategory::Old);
        run_seconds(&mut bird, &mut state, 40);
        assert!(bird.health() < STAT_MAX);
    }

    #[test]
    fn neglected_hen_stops_laying() {
        let mut bird = hen().with_age_minutes(3);
        let mut state = GameState::default();
        bird.set_food(0);
        run_seconds(&mut bird, &mut state, 30);
        assert!(bird.care() <= 50);
        assert!(!bird.is_egg_layer());
        assert_eq!(state.eggs(Species::Chicken), 0);
        assert_eq!(bird.eggs_laid(), 0);
    }

    #[test]
    fn care_blends_with_food_every_ten_seconds() {
        let mut bird = hen();
        let mut state = GameState::default();
        bird.set_food(40);
        run_seconds(&mut bird, &mut state, 9);
        assert_eq!(bird.care(), 100);
        run_seconds(&mut bird, &mut state, 1);
        // Food decayed to 35 on the even seconds; (100 + 35) / 2 rounds up.
        assert_eq!(bird.food(), 35);
        assert_eq!(bird.care(), 68);
    }

    #[test]
    fn behaviour_every_five_seconds_and_lay_wins_the_shared_second() {
        let binding = Rc::new(RefCell::new(Headless::default()));
        let mut bird = Animal::new(
            Species::Chicken,
            Gender::Female,
            Box::new(Shared(binding.clone())),
            LifecycleConfig::default(),
        )
        .with_age_minutes(3);
        let mut state = GameState::default();

        run_seconds(&mut bird, &mut state, 4);
        assert_eq!(binding.borrow().clip, Some(AnimationTag::Idle));
        assert_eq!(binding.borrow().facing, 0.0);

        run_seconds(&mut bird, &mut state, 1);
        let clip = binding.borrow().clip.unwrap();
        assert!(AnimationTag::BEHAVIOURS.contains(&clip));
        assert_ne!(binding.borrow().facing, 0.0);
        assert_eq!(binding.borrow().facing, bird.facing());

        run_seconds(&mut bird, &mut state, 25);
        assert_eq!(state.eggs(Species::Chicken), 1);
        assert_eq!(binding.borrow().clip, Some(AnimationTag::Lay));
        assert_eq!(bird.animation(), AnimationTag::Lay);
    }
}
