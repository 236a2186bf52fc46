//! Frame timing for the simulation and the demo viewer

use std::time::{Duration, Instant};

/// Largest step fed to the blade physics. Long stalls (window drags,
/// breakpoints) would otherwise explode the spring integration.
pub const MAX_SIMULATION_STEP: f32 = 1.0 / 15.0;

/// Tracks frame delta, total elapsed time and a once-per-second FPS estimate
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    delta: Duration,
    frame_count: u64,
    fps_timer: Instant,
    fps_frame_count: u32,
    fps: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
            fps_timer: now,
            fps_frame_count: 0,
            fps: 0.0,
        }
    }

    /// Call once per frame, before updating the grass field
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.advance(now);
    }

    fn advance(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;
        self.fps_frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_timer);
        if fps_elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frame_count as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = 0;
            self.fps_timer = now;
        }
    }

    /// Raw delta time in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Delta time clamped to [`MAX_SIMULATION_STEP`]
    pub fn simulation_step(&self) -> f32 {
        self.delta_secs().min(MAX_SIMULATION_STEP)
    }

    /// Seconds since the clock was created (as of the last tick)
    pub fn elapsed_secs(&self) -> f32 {
        self.last_frame.saturating_duration_since(self.start).as_secs_f32()
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_step_is_clamped() {
        let mut clock = FrameClock::new();
        let later = clock.last_frame + Duration::from_secs(2);
        clock.advance(later);
        assert!((clock.delta_secs() - 2.0).abs() < 1e-4);
        assert_eq!(clock.simulation_step(), MAX_SIMULATION_STEP);
        assert!((clock.elapsed_secs() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_fps_after_one_second() {
        let mut clock = FrameClock::new();
        let base = clock.last_frame;
        for i in 1..=10 {
            clock.advance(base + Duration::from_millis(100 * i));
        }
        assert_eq!(clock.frame_count(), 10);
        assert!((clock.fps() - 10.0).abs() < 0.01);
    }
}
