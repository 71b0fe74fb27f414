//! Fixed-duration progress sequence.
//!
//! The sequence is paced by wall-clock ticks only; it never observes the
//! real request.

use crate::model::{ProgressPhase, ProgressState};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const DEFAULT_TOTAL: Duration = Duration::from_millis(36_000);
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRefused {
    AlreadyRunning,
}

pub struct ProgressSequence {
    tick: Duration,
    state: ProgressState,
    // Anchored on the first `run` so a resumed sequence keeps its schedule.
    ticker: Option<Interval>,
}

impl ProgressSequence {
    pub fn new(total: Duration, tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
            state: ProgressState::idle(total),
            ticker: None,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.elapsed >= self.state.total
    }

    /// Arm the sequence. A running sequence must be reset first.
    pub fn start(&mut self) -> Result<(), StartRefused> {
        if self.state.phase == ProgressPhase::Running {
            return Err(StartRefused::AlreadyRunning);
        }
        self.reset();
        self.state.phase = ProgressPhase::Running;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state = ProgressState::idle(self.state.total);
        self.ticker = None;
    }

    /// Advance one tick and recompute the percentage.
    pub fn advance(&mut self) -> &ProgressState {
        step(&mut self.state, self.tick);
        &self.state
    }

    pub fn finish(&mut self, success: bool) {
        self.state.phase = if success {
            ProgressPhase::Success
        } else {
            ProgressPhase::Failed
        };
    }

    /// Tick until complete, reporting every step.
    ///
    /// Dropping the future stops the sequence where it is; calling `run`
    /// again resumes on the same tick schedule.
    pub async fn run<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(&ProgressState),
    {
        let tick = self.tick;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut t = interval_at(Instant::now() + tick, tick);
            t.set_missed_tick_behavior(MissedTickBehavior::Delay);
            t
        });
        while self.state.elapsed < self.state.total {
            ticker.tick().await;
            step(&mut self.state, tick);
            on_tick(&self.state);
        }
    }
}

fn step(state: &mut ProgressState, tick: Duration) {
    state.elapsed += tick;
    state.percent = percent_of(state.elapsed, state.total);
}

fn percent_of(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_nanos() as f64 / total.as_nanos() as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_completion_in_ceil_total_over_tick_ticks() {
        let mut seq = ProgressSequence::new(DEFAULT_TOTAL, DEFAULT_TICK);
        seq.start().unwrap();
        let mut ticks = 0;
        while !seq.is_complete() {
            let p = seq.advance().percent;
            assert!(p <= 1.0);
            ticks += 1;
        }
        assert_eq!(ticks, 360);
        assert_eq!(seq.state().percent, 1.0);
    }

    #[test]
    fn uneven_tick_rounds_up_and_caps_at_one() {
        let mut seq = ProgressSequence::new(Duration::from_millis(250), Duration::from_millis(100));
        seq.start().unwrap();
        let percents: Vec<f64> = std::iter::from_fn(|| {
            (!seq.is_complete()).then(|| seq.advance().percent)
        })
        .collect();
        assert_eq!(percents, vec![0.4, 0.8, 1.0]);
    }

    #[test]
    fn cannot_restart_mid_flight() {
        let mut seq = ProgressSequence::new(DEFAULT_TOTAL, DEFAULT_TICK);
        seq.start().unwrap();
        seq.advance();
        assert_eq!(seq.start(), Err(StartRefused::AlreadyRunning));
        seq.reset();
        assert_eq!(seq.state().phase, ProgressPhase::Idle);
        seq.start().unwrap();
        assert_eq!(seq.state().elapsed, Duration::ZERO);
    }

    #[test]
    fn finished_sequence_can_start_again() {
        let mut seq = ProgressSequence::new(Duration::from_millis(100), Duration::from_millis(100));
        seq.start().unwrap();
        seq.advance();
        seq.finish(true);
        seq.start().unwrap();
        assert_eq!(seq.state().percent, 0.0);
        assert_eq!(seq.state().phase, ProgressPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn run_takes_the_full_wall_clock_duration() {
        let mut seq = ProgressSequence::new(DEFAULT_TOTAL, DEFAULT_TICK);
        seq.start().unwrap();
        let started = Instant::now();
        let mut reported = Vec::new();
        seq.run(|s| reported.push(s.percent)).await;
        assert_eq!(started.elapsed(), DEFAULT_TOTAL);
        assert_eq!(reported.len(), 360);
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reported.last().copied(), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_resumes_where_it_stopped() {
        let mut seq = ProgressSequence::new(Duration::from_secs(1), DEFAULT_TICK);
        seq.start().unwrap();
        let _ = tokio::time::timeout(Duration::from_millis(450), seq.run(|_| {})).await;
        assert_eq!(seq.state().elapsed, Duration::from_millis(400));
        let started = Instant::now();
        seq.run(|_| {}).await;
        // Ticks stay on the 100ms grid laid down by the first run.
        assert_eq!(started.elapsed(), Duration::from_millis(550));
        assert!(seq.is_complete());
    }
}
