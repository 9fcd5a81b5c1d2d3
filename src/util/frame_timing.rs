use web_time::{Duration, Instant};

/// Longest tick the rig is allowed to integrate in one step. Stalls beyond
/// this (window drags, debugger pauses) are treated as one long frame.
const MAX_TICK: Duration = Duration::from_millis(250);

/// Per-tick delta time source with an optional frame cap and a smoothed FPS
/// readout.
pub struct FrameTiming {
    /// Minimum frame duration (zero = uncapped).
    min_frame_duration: Duration,
    /// Timestamp of the previous tick.
    last_tick: Instant,
    /// Exponential moving average of the frame rate.
    smoothed_fps: f32,
    /// Weight of the newest sample in the moving average.
    smoothing: f32,
}

impl FrameTiming {
    /// Create a timer capped at `target_fps` (0 = unlimited).
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let min_frame_duration = if target_fps > 0 {
            Duration::from_secs_f64(1.0 / f64::from(target_fps))
        } else {
            Duration::ZERO
        };

        Self {
            min_frame_duration,
            last_tick: Instant::now(),
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Whether enough time has passed since the last tick to render again.
    #[must_use]
    pub fn should_render(&self) -> bool {
        self.last_tick.elapsed() >= self.min_frame_duration
    }

    /// Advance to a new tick and return its delta time in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick).min(MAX_TICK);
        self.last_tick = now;

        let dt = elapsed.as_secs_f32();
        if dt > 0.0 {
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + (1.0 / dt) * self.smoothing;
        }
        dt
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}
