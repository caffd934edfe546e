//! A "time left" field that counts down while a stopwatch counts up.
use std::sync::Arc;

use crate::{
    duration::{Units, format_duration, parse_duration},
    error::StopwatchError,
    instance::Instance,
    settings::{OnTick, Overrides, Setting},
    surface::{ElementId, Surface},
};

/// Companion display showing how much of an initial budget remains.
///
/// Once the stopwatch passes the budget the field is blanked rather than
/// going negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    field: ElementId,
    initial: u64,
}

impl Countdown {
    /// # Errors
    ///
    /// `StopwatchError::InvalidDuration` if `initial` is not a duration.
    pub fn new(field: ElementId, initial: &str) -> Result<Self, StopwatchError> {
        Ok(Self {
            field,
            initial: parse_duration(initial)?,
        })
    }

    #[must_use]
    pub const fn field(&self) -> ElementId {
        self.field
    }

    #[must_use]
    pub const fn remaining(&self, elapsed: Units) -> Option<Units> {
        match self.initial.checked_sub(elapsed.total_seconds()) {
            Some(left) => Some(Units::from_seconds(left)),
            None => None,
        }
    }

    #[must_use]
    pub fn render(&self, elapsed: Units) -> String {
        self.remaining(elapsed).map_or_else(String::new, format_duration)
    }

    #[must_use]
    pub fn on_tick(self) -> OnTick {
        Arc::new(move |_: &Instance, units: Units, surface: &mut dyn Surface| {
            surface.set_value(self.field, &self.render(units));
        })
    }

    /// Options for the stopwatch this countdown follows. The stopwatch
    /// starts from zero regardless of what its own field shows.
    #[must_use]
    pub fn overrides(self) -> Overrides {
        Overrides {
            on_tick: Setting::Set(self.on_tick()),
            ..Overrides::new().count_from_input(false)
        }
    }
}
