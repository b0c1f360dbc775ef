use std::time::Duration;

pub use instant::Instant;

/// Longest step fed to simulation; anything above is treated as a stall.
const MAX_DELTA: Duration = Duration::from_millis(250);

/// Measures frame durations and paces the loop to a target rate.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Instant,
    budget: Duration,
}

impl FrameClock {
    pub fn new(target_fps: u32) -> Self {
        Self {
            last: Instant::now(),
            budget: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
        }
    }

    /// Seconds since the previous tick, capped at [`MAX_DELTA`].
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last).min(MAX_DELTA);
        self.last = now;
        delta.as_secs_f32()
    }

    /// When the next frame is due.
    pub fn next_frame_at(&self) -> Instant {
        self.last + self.budget
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}
