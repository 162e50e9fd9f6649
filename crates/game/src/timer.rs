use std::time::Duration;

const MAX_DELTA: Duration = Duration::from_millis(100);
/// Deltas within this distance of the fixed target are snapped to it, which
/// keeps vsync jitter from accumulating into an extra update.
const SNAP_TOLERANCE: Duration = Duration::from_micros(250);

/// Frame timer with variable or fixed update steps.
///
/// The host measures wall time and passes the delta in; the timer decides how
/// many updates that delta is worth.
#[derive(Debug, Clone)]
pub struct StepTimer {
    elapsed: Duration,
    total: Duration,
    left_over: Duration,
    frame_count: u64,
    frames_per_second: u32,
    frames_this_second: u32,
    second_counter: Duration,
    fixed_step: Option<Duration>,
}

impl Default for StepTimer {
    fn default() -> Self {
        Self {
            elapsed: Duration::ZERO,
            total: Duration::ZERO,
            left_over: Duration::ZERO,
            frame_count: 0,
            frames_per_second: 0,
            frames_this_second: 0,
            second_counter: Duration::ZERO,
            fixed_step: None,
        }
    }
}

impl StepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed_step(step: Duration) -> Self {
        Self {
            fixed_step: Some(step),
            ..Self::default()
        }
    }

    pub fn set_fixed_step(&mut self, step: Option<Duration>) {
        self.fixed_step = step;
    }

    /// Time covered by the most recent update.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of updates run since construction.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    /// Forget time accumulated while the host was paused, e.g. on resume.
    pub fn reset_elapsed(&mut self) {
        self.left_over = Duration::ZERO;
        self.frames_this_second = 0;
        self.frames_per_second = 0;
        self.second_counter = Duration::ZERO;
    }

    /// Account for `delta` of wall time and return how many updates to run.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        let mut delta = delta.min(MAX_DELTA);
        let last_frame_count = self.frame_count;
        self.second_counter += delta;

        let updates = match self.fixed_step {
            Some(step) if !step.is_zero() => {
                if delta.abs_diff(step) < SNAP_TOLERANCE {
                    delta = step;
                }
                self.left_over += delta;
                let mut updates = 0;
                while self.left_over >= step {
                    self.elapsed = step;
                    self.total += step;
                    self.left_over -= step;
                    self.frame_count += 1;
                    updates += 1;
                }
                updates
            }
            _ => {
                self.elapsed = delta;
                self.total += delta;
                self.left_over = Duration::ZERO;
                self.frame_count += 1;
                1
            }
        };

        if self.frame_count != last_frame_count {
            self.frames_this_second += 1;
        }
        if self.second_counter >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_counter = Duration::from_nanos(
                (self.second_counter.as_nanos() % 1_000_000_000) as u64,
            );
        }

        updates
    }
}
