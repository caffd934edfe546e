use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::{
    duration::{Units, format_duration},
    settings::Options,
    surface::ElementId,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Paused,
}

/// One stopwatch bound to one display element.
///
/// Elapsed time is `accumulated_ms` plus the configured `count_from`, plus
/// the current run segment while running. `started_at` is set exactly when
/// the instance is running, and only a running instance has a pending tick.
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    target: ElementId,
    control: Option<ElementId>,
    options: Options,
    started_at: Option<Instant>,
    // Signed: reconciling against an edited display that reads less than
    // `count_from` banks a negative amount.
    accumulated_ms: i64,
    pending: Option<Instant>,
}

impl Instance {
    #[must_use]
    pub const fn new(id: InstanceId, target: ElementId, options: Options) -> Self {
        Self {
            id,
            target,
            control: None,
            options,
            started_at: None,
            accumulated_ms: 0,
            pending: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub const fn target(&self) -> ElementId {
        self.target
    }

    #[must_use]
    pub const fn control(&self) -> Option<ElementId> {
        self.control
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub const fn accumulated_ms(&self) -> i64 {
        self.accumulated_ms
    }

    #[must_use]
    pub const fn pending(&self) -> Option<Instant> {
        self.pending
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        if self.started_at.is_some() {
            RunState::Running
        } else {
            RunState::Paused
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Total elapsed milliseconds at `now`, `count_from` included.
    #[must_use]
    pub fn elapsed_ms(&self, now: Instant, defaults: &Options) -> i64 {
        let segment = self
            .started_at
            .map_or(0, |start| duration_ms(now.saturating_duration_since(start)));
        self.banked_ms(defaults).saturating_add(segment)
    }

    #[must_use]
    pub fn elapsed_units(&self, now: Instant, defaults: &Options) -> Units {
        let seconds = self.elapsed_ms(now, defaults).div_euclid(1000).max(0);
        Units::from_seconds(seconds.unsigned_abs())
    }

    #[must_use]
    pub fn display(&self, now: Instant, defaults: &Options) -> String {
        format_duration(self.elapsed_units(now, defaults))
    }

    pub(crate) fn set_control(&mut self, control: ElementId) {
        self.control = Some(control);
    }

    pub(crate) fn take_control(&mut self) -> Option<ElementId> {
        self.control.take()
    }

    pub(crate) fn set_count_from(&mut self, seconds: u64) {
        self.options.count_from = Some(seconds);
    }

    /// Begin a run segment. Returns `false` if already running.
    pub(crate) fn resume(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Fold the current run segment into the banked time and drop the
    /// pending tick. Returns `false` if already paused.
    pub(crate) fn pause(&mut self, now: Instant) -> bool {
        let Some(start) = self.started_at.take() else {
            return false;
        };
        self.accumulated_ms = self
            .accumulated_ms
            .saturating_add(duration_ms(now.saturating_duration_since(start)));
        self.pending = None;
        true
    }

    /// Bring the banked time in line with what the display says, in case it
    /// was edited while paused. Returns `true` if anything changed.
    pub(crate) fn reconcile(
        &mut self,
        displayed_seconds: u64,
        defaults: &Options,
    ) -> bool {
        let displayed_ms = seconds_ms(displayed_seconds);
        if self.banked_ms(defaults).div_euclid(1000) == displayed_ms / 1000 {
            return false;
        }
        self.accumulated_ms = displayed_ms
            .saturating_sub(seconds_ms(self.options.count_from(defaults)));
        true
    }

    pub(crate) fn schedule(&mut self, at: Instant) {
        self.pending = Some(at);
    }

    pub(crate) fn cancel(&mut self) {
        self.pending = None;
    }

    fn banked_ms(&self, defaults: &Options) -> i64 {
        self.accumulated_ms
            .saturating_add(seconds_ms(self.options.count_from(defaults)))
    }
}

fn seconds_ms(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX).saturating_mul(1000)
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
