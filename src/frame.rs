use std::cell::Cell;

/// Source of the current time in seconds.
pub trait Clock {
    fn now_secs(&self) -> f64;
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }

    pub fn set(&self, secs: f64) {
        self.now.set(secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        self.now.get()
    }
}

/// Turns wall-clock readings into capped delta times and drives one
/// update followed by one render per tick.
#[derive(Debug)]
pub struct FrameLoop {
    last: f64,
    max_dt: f32,
    running: bool,
}

impl FrameLoop {
    pub fn new(start: f64, max_dt: f32) -> Self {
        Self {
            last: start,
            max_dt,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stops the loop; later ticks do nothing.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Runs one frame at time `now` (seconds): `update` with the capped
    /// delta, then `render`. Returns false once cancelled.
    pub fn tick<S>(
        &mut self,
        now: f64,
        state: &mut S,
        update: impl FnOnce(&mut S, f32),
        render: impl FnOnce(&S),
    ) -> bool {
        if !self.running {
            return false;
        }
        let dt = ((now - self.last).max(0.0) as f32).min(self.max_dt);
        self.last = now;
        update(state, dt);
        render(state);
        true
    }
}
