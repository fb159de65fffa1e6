//! Frame timing with a pause-gated animation clock.
//!
//! Every frame produces two deltas: the real frame time, which drives the
//! camera and input, and the animation delta, which drives orbits, comets and
//! the collapse ramp. Pausing zeroes only the latter, so the solar system
//! freezes while the user can still fly around it.
//!
//! # Example
//!
//! ```ignore
//! use orrery::time::SceneClock;
//!
//! let mut clock = SceneClock::new();
//!
//! // In the frame loop:
//! let tick = clock.tick_now();
//! camera.update(tick.dt);
//! orbits.advance(tick.animation_dt);
//! ```

use std::time::Instant;

/// Timing values for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Real seconds since the previous frame.
    pub dt: f32,
    /// Seconds of simulated time this frame: `0` while paused.
    pub animation_dt: f32,
    /// Total simulated seconds, including this frame.
    pub sim_time: f32,
    /// Whether the clock was paused for this frame.
    pub paused: bool,
}

/// Pause-aware frame clock.
///
/// Times are plain seconds so the clock can be driven from a test without
/// sleeping. [`SceneClock::tick_now`] feeds it from a monotonic [`Instant`].
#[derive(Debug)]
pub struct SceneClock {
    /// Origin for [`SceneClock::tick_now`].
    start: Instant,
    /// Timestamp of the last tick, in seconds.
    last_frame: f64,
    /// Total simulated time in seconds.
    sim_elapsed: f64,
    /// Real delta of the last tick.
    delta_secs: f32,
    /// Total ticks since creation.
    frame_count: u64,
    /// Frames per second, refreshed every `fps_update_interval`.
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: f64,
    fps_update_interval: f64,
    paused: bool,
    /// Multiplier applied to the animation delta (1.0 = real time).
    time_scale: f32,
}

impl SceneClock {
    /// Create a clock whose first tick is measured from now.
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Create a clock whose previous frame happened at `start_secs`.
    pub fn starting_at(start_secs: f64) -> Self {
        Self {
            start: Instant::now(),
            last_frame: start_secs,
            sim_elapsed: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: start_secs,
            fps_update_interval: 0.5,
            paused: false,
            time_scale: 1.0,
        }
    }

    /// Advance to the wall-clock time elapsed since the clock was created.
    pub fn tick_now(&mut self) -> Tick {
        let now = self.start.elapsed().as_secs_f64();
        self.tick(now)
    }

    /// Advance the clock to `now` (seconds). Call once per frame.
    ///
    /// A timestamp earlier than the previous frame yields a zero delta.
    pub fn tick(&mut self, now: f64) -> Tick {
        let dt = (now - self.last_frame).max(0.0);
        self.last_frame += dt;
        self.delta_secs = dt as f32;
        self.frame_count += 1;

        let animation_dt = if self.paused {
            0.0
        } else {
            self.delta_secs * self.time_scale
        };
        self.sim_elapsed += animation_dt as f64;

        self.fps_frame_count += 1;
        let since_fps = self.last_frame - self.fps_update_time;
        if since_fps >= self.fps_update_interval {
            self.fps = (self.fps_frame_count as f64 / since_fps) as f32;
            self.fps_frame_count = 0;
            self.fps_update_time = self.last_frame;
        }

        Tick {
            dt: self.delta_secs,
            animation_dt,
            sim_time: self.sim_elapsed as f32,
            paused: self.paused,
        }
    }

    /// Real seconds of the last frame.
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total simulated seconds.
    pub fn sim_time(&self) -> f32 {
        self.sim_elapsed as f32
    }

    /// Number of ticks so far.
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Most recent frames-per-second estimate.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether animation time is frozen.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze animation time.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume animation time.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Flip between paused and running.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Current animation speed multiplier.
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the animation speed multiplier. Negative values are clamped to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for SceneClock {
    fn default() -> Self {
        Self::new()
    }
}
