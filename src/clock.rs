use std::time::Instant;

/// Turns wall-clock frame gaps into simulation deltas.
///
/// A frame longer than `max_frame_secs` (tab in the background, debugger
/// pause) is clamped so a single frame can only catch up a bounded amount
/// of simulated time.
#[derive(Debug, Clone)]
pub struct Clock {
    max_frame_secs: f64,
    last: Option<Instant>,
}

impl Clock {
    pub fn new(max_frame_secs: f64) -> Self {
        Self {
            max_frame_secs,
            last: None,
        }
    }

    /// Bounds a caller-measured delta.
    pub fn step(&self, real_dt: f64) -> f64 {
        if real_dt.is_finite() && real_dt > 0.0 {
            real_dt.min(self.max_frame_secs)
        } else {
            0.0
        }
    }

    /// Measures the gap since the previous call. The first call returns 0.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let real_dt = match self.last.replace(now) {
            Some(previous) => now.saturating_duration_since(previous).as_secs_f64(),
            None => 0.0,
        };
        self.step(real_dt)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(1.0)
    }
}
