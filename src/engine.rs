use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::FarmConfig;
use crate::creature::{HeadlessStage, Stage};
use crate::economy::{Action, EconomyController, Outcome};
use crate::farm::Farm;
use crate::registry::EntityId;
use crate::state::Observer;

type RenderHook = Box<dyn FnMut(&Farm)>;

/// A player action scheduled at a point of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_secs: f64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScriptRecord {
    pub at_secs: f64,
    pub action: Action,
    pub outcome: Outcome,
}

pub struct GameLoopBuilder {
    config: FarmConfig,
    stage: Box<dyn Stage>,
    observers: Vec<Box<dyn Observer>>,
    render: Option<RenderHook>,
}

impl GameLoopBuilder {
    pub fn new(config: FarmConfig) -> Self {
        Self {
            config,
            stage: Box::new(HeadlessStage::new()),
            observers: Vec::new(),
            render: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stage = Box::new(stage);
        self
    }

    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Runs after every simulated frame; this is where a renderer draws.
    pub fn on_render(mut self, hook: impl FnMut(&Farm) + 'static) -> Self {
        self.render = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> GameLoop {
        let mut farm = Farm::from_config(&self.config, self.stage);
        for observer in self.observers {
            farm.subscribe(observer);
        }
        GameLoop {
            clock: Clock::new(self.config.max_frame_secs),
            economy: EconomyController::new(self.config.prices.clone()),
            farm,
            render: self.render,
            frames: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f64,
    pub living: u64,
}

/// Drives clock, flock and render hook one frame at a time, and is the
/// single entry point for player actions.
pub struct GameLoop {
    clock: Clock,
    economy: EconomyController,
    farm: Farm,
    render: Option<RenderHook>,
    frames: u64,
}

impl GameLoop {
    pub fn frame(&mut self, real_dt: f64) -> FrameReport {
        let dt = self.clock.step(real_dt);
        self.advance(dt)
    }

    /// Runs a frame sized by the wall-clock gap since the previous tick.
    pub fn tick(&mut self, now: Instant) -> FrameReport {
        let dt = self.clock.tick(now);
        self.advance(dt)
    }

    fn advance(&mut self, dt: f64) -> FrameReport {
        self.farm.advance(dt);
        if let Some(render) = self.render.as_mut() {
            render(&self.farm);
        }
        self.frames += 1;
        FrameReport {
            frame: self.frames,
            dt,
            living: self.farm.living_count(),
        }
    }

    /// Simulates `seconds` of game time at a fixed frame rate.
    pub fn run_for(&mut self, seconds: f64, fps: u32) -> u64 {
        let fps = fps.max(1);
        let frame_dt = 1.0 / f64::from(fps);
        let frames = (seconds * f64::from(fps)).round().max(0.0) as u64;
        for _ in 0..frames {
            self.frame(frame_dt);
        }
        frames
    }

    /// Like [`GameLoop::run_for`], dispatching each scripted action on the
    /// first frame that reaches its time. Steps past the end never fire.
    pub fn run_scripted(&mut self, seconds: f64, fps: u32, steps: &[ScriptStep]) -> Vec<ScriptRecord> {
        let mut pending: Vec<ScriptStep> = steps.to_vec();
        pending.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        let mut pending = pending.into_iter().peekable();
        let mut records = Vec::new();

        let fps = fps.max(1);
        let frame_dt = 1.0 / f64::from(fps);
        let frames = (seconds * f64::from(fps)).round().max(0.0) as u64;
        for frame in 0..frames {
            let now = frame as f64 * frame_dt;
            while let Some(step) = pending.next_if(|step| step.at_secs <= now) {
                let outcome = self.on_action(step.action);
                records.push(ScriptRecord {
                    at_secs: now,
                    action: step.action,
                    outcome,
                });
            }
            self.frame(frame_dt);
        }
        records
    }

    pub fn on_action(&mut self, action: Action) -> Outcome {
        self.economy.apply(&mut self.farm, action)
    }

    pub fn inspect(&mut self, id: Option<EntityId>) {
        self.farm.inspect(id);
    }

    pub fn farm(&self) -> &Farm {
        &self.farm
    }

    pub fn farm_mut(&mut self) -> &mut Farm {
        &mut self.farm
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
