#![forbid(unsafe_code)]

//! Virtual clock, timer queue and opacity animations.
//!
//! The scheduler only stores work; [`Document`] drives it so every job can
//! receive `&mut Document` without an outstanding borrow.
//!
//! # Invariants
//!
//! - Timers fire in `(deadline, insertion)` order.
//! - The clock never moves backwards and saturates at `Duration::MAX`.
//! - An animation's completion job runs after its final frame is written.

use std::fmt;
use std::time::Duration;

use web_time::Instant;

use crate::document::Document;
use crate::node::NodeId;

/// Deferred continuation run by the document's job queue.
pub type Job = Box<dyn FnOnce(&mut Document)>;

/// Upper bound on jobs run by a single advance. A job that keeps
/// rescheduling itself at zero delay would otherwise never yield.
pub(crate) const MAX_JOBS_PER_ADVANCE: usize = 10_000;

struct Timer {
    deadline: Duration,
    seq: u64,
    job: Job,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Animation {
    pub(crate) seq: u64,
    pub(crate) node: NodeId,
    pub(crate) from: f64,
    pub(crate) to: f64,
    pub(crate) start: Duration,
    pub(crate) duration: Duration,
}

impl Animation {
    /// Interpolated opacity at `now`, linear in time.
    pub(crate) fn value_at(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_sub(self.start).as_secs_f64();
        let t = (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }
}

#[derive(Default)]
pub(crate) struct Scheduler {
    now: Duration,
    seq: u64,
    timers: Vec<Timer>,
    animations: Vec<Animation>,
    last_pump: Option<Instant>,
}

impl Scheduler {
    #[inline]
    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn set_now(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    pub(crate) fn schedule(&mut self, delay: Duration, job: Job) {
        let seq = self.next_seq();
        self.timers.push(Timer {
            deadline: self.now.saturating_add(delay),
            seq,
            job,
        });
    }

    pub(crate) fn start_animation(
        &mut self,
        node: NodeId,
        from: f64,
        to: f64,
        duration: Duration,
    ) -> u64 {
        let seq = self.next_seq();
        self.animations.push(Animation {
            seq,
            node,
            from,
            to,
            start: self.now,
            duration,
        });
        seq
    }

    pub(crate) fn finish_animation(&mut self, seq: u64) {
        self.animations.retain(|a| a.seq != seq);
    }

    pub(crate) fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub(crate) fn is_animating(&self, node: NodeId) -> bool {
        self.animations.iter().any(|a| a.node == node)
    }

    /// Remove and return the earliest timer due at or before `limit`.
    pub(crate) fn pop_due(&mut self, limit: Duration) -> Option<(Duration, Job)> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= limit)
            .min_by_key(|(_, t)| (t.deadline, t.seq))
            .map(|(i, _)| i)?;
        let timer = self.timers.remove(idx);
        Some((timer.deadline, timer.job))
    }

    pub(crate) fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    pub(crate) fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Wall time since the previous pump; zero on the first call.
    pub(crate) fn take_elapsed(&mut self, now: Instant) -> Duration {
        let elapsed = self
            .last_pump
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_pump = Some(now);
        elapsed
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("timers", &self.timers.len())
            .field("animations", &self.animations.len())
            .finish()
    }
}

/// Render an opacity value the way a style sheet would (`1`, `0.5`, `0.125`).
pub(crate) fn format_opacity(value: f64) -> String {
    let s = format!("{:.3}", value.clamp(0.0, 1.0));
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}
