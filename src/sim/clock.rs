/// Fixed-timestep clock.
///
/// Wall-clock time accumulates; every whole step above the accumulator
/// threshold is handed out, at most `max_steps` per frame. When a frame hits
/// the cap with time still owed, the backlog is dropped instead of carried,
/// so a slow stretch never snowballs into ever longer catch-up frames.

use log::trace;

use crate::config::ClockConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct SimClock {
    step: f32,
    max_steps: u32,
    accumulator: f32,
    /// Total fixed steps handed out so far.
    pub steps: u64,
}

impl SimClock {
    pub fn new(cfg: &ClockConfig) -> Self {
        SimClock { step: 1.0 / cfg.step_hz, max_steps: cfg.max_steps.max(1), accumulator: 0.0, steps: 0 }
    }

    /// Length of one fixed step, in seconds.
    pub fn dt(&self) -> f32 {
        self.step
    }

    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    /// Feed `elapsed` seconds of wall time. Returns how many fixed steps to run now.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed.max(0.0);
        let mut n = 0;
        while self.accumulator > self.step && n < self.max_steps {
            self.accumulator -= self.step;
            n += 1;
        }
        if n == self.max_steps && self.accumulator > self.step {
            trace!("clock: dropping {:.4}s of backlog", self.accumulator);
            self.accumulator = 0.0;
        }
        self.steps += n as u64;
        n
    }

    /// Run `f` once per due step.
    pub fn run<F: FnMut(f32)>(&mut self, elapsed: f32, mut f: F) -> u32 {
        let n = self.advance(elapsed);
        for _ in 0..n {
            f(self.step);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> SimClock {
        SimClock::new(&ClockConfig { step_hz: 60.0, max_steps: 5 })
    }

    #[test]
    fn exact_step_waits_for_more_time() {
        // Strictly greater than one step is required.
        let mut c = SimClock::new(&ClockConfig { step_hz: 4.0, max_steps: 5 });
        assert_eq!(c.advance(0.25), 0);
        assert_eq!(c.advance(0.25), 1);
        assert_eq!(c.pending(), 0.25);
    }

    #[test]
    fn remainder_carries_over() {
        let mut c = clock();
        assert_eq!(c.advance(0.04), 2);
        assert!((c.pending() - (0.04 - 2.0 / 60.0)).abs() < 1e-6);
    }

    #[test]
    fn catch_up_is_capped_and_backlog_dropped() {
        let mut c = clock();
        assert_eq!(c.advance(1.0), 5);
        assert_eq!(c.pending(), 0.0);
        assert_eq!(c.advance(0.0), 0);
        assert_eq!(c.steps, 5);
    }

    #[test]
    fn negative_elapsed_is_ignored() {
        let mut c = clock();
        assert_eq!(c.advance(-3.0), 0);
        assert_eq!(c.pending(), 0.0);
    }

    #[test]
    fn run_invokes_callback_per_step() {
        let mut c = clock();
        let mut total = 0.0;
        let n = c.run(0.045, |dt| total += dt);
        assert_eq!(n, 2);
        assert!((total - 2.0 / 60.0).abs() < 1e-6);
    }
}
