/// Simulation clock with pause, single-frame stepping and time scaling.
///
/// Child clocks (e.g. a player's animation clock) are advanced with the
/// parent's scaled delta, so pausing or slowing the game clock applies to
/// them too.
#[derive(Debug, Clone, PartialEq)]
pub struct Clock {
    total_seconds: f32,
    delta_seconds: f32,
    time_scale: f32,
    max_delta_seconds: f32,
    frame_count: u64,
    paused: bool,
    step_single_frame: bool,
}

pub const MAX_DELTA_SECONDS: f32 = 0.1;

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            total_seconds: 0.0,
            delta_seconds: 0.0,
            time_scale: 1.0,
            max_delta_seconds: MAX_DELTA_SECONDS,
            frame_count: 0,
            paused: false,
            step_single_frame: false,
        }
    }

    /// Advances by `raw_delta` real seconds and returns the scaled delta
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        let stepping = self.step_single_frame;
        if stepping {
            self.paused = false;
        }

        let clamped = raw_delta.clamp(0.0, self.max_delta_seconds);
        self.delta_seconds = if self.paused { 0.0 } else { clamped * self.time_scale };
        self.total_seconds += self.delta_seconds;
        self.frame_count += 1;

        if stepping {
            self.step_single_frame = false;
            self.paused = true;
        }
        self.delta_seconds
    }

    pub fn reset(&mut self) {
        self.total_seconds = 0.0;
        self.delta_seconds = 0.0;
        self.frame_count = 0;
    }

    pub fn total_seconds(&self) -> f32 {
        self.total_seconds
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta_seconds
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second implied by the last delta, 0 while paused
    pub fn frame_rate(&self) -> f32 {
        if self.delta_seconds > 0.0 {
            self.time_scale / self.delta_seconds
        } else {
            0.0
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Runs exactly one more frame, then pauses
    pub fn step_single_frame(&mut self) {
        self.step_single_frame = true;
    }
}
