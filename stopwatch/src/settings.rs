//! Per-instance options and the registry-wide defaults they fall back to.
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::{duration::Units, instance::Instance, surface::Surface};

/// Called after every redisplay with the instance and its elapsed units.
/// The surface is handed over so the callback can update companion fields.
pub type OnTick = Arc<dyn Fn(&Instance, Units, &mut dyn Surface) + Send + Sync>;

/// One field of an [`Overrides`] set.
#[derive(Clone)]
pub enum Setting<T> {
    /// Leave whatever is there.
    Keep,
    Set(T),
    /// Clear the field so lookups fall through to the next layer.
    Unset,
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T: Clone> Setting<T> {
    fn apply(&self, field: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Set(value) => *field = Some(value.clone()),
            Self::Unset => *field = None,
        }
    }
}

/// A batch of changes to merge into [`Options`].
#[derive(Clone, Default)]
pub struct Overrides {
    pub auto_start: Setting<bool>,
    pub count_from: Setting<u64>,
    pub count_from_input: Setting<bool>,
    pub on_tick: Setting<OnTick>,
}

impl Overrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn auto_start(mut self, value: bool) -> Self {
        self.auto_start = Setting::Set(value);
        self
    }

    #[must_use]
    pub fn count_from(mut self, seconds: u64) -> Self {
        self.count_from = Setting::Set(seconds);
        self
    }

    #[must_use]
    pub fn count_from_input(mut self, value: bool) -> Self {
        self.count_from_input = Setting::Set(value);
        self
    }

    #[must_use]
    pub fn on_tick<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Instance, Units, &mut dyn Surface) + Send + Sync + 'static,
    {
        self.on_tick = Setting::Set(Arc::new(callback));
        self
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show<T: fmt::Debug>(setting: &Setting<T>) -> String {
            match setting {
                Setting::Keep => "Keep".to_string(),
                Setting::Set(value) => format!("Set({value:?})"),
                Setting::Unset => "Unset".to_string(),
            }
        }
        let on_tick = match self.on_tick {
            Setting::Keep => "Keep",
            Setting::Set(_) => "Set(..)",
            Setting::Unset => "Unset",
        };
        f.debug_struct("Overrides")
            .field("auto_start", &show(&self.auto_start))
            .field("count_from", &show(&self.count_from))
            .field("count_from_input", &show(&self.count_from_input))
            .field("on_tick", &on_tick)
            .finish()
    }
}

/// A layer of option values. Absent fields defer to the layer below.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Options {
    pub auto_start: Option<bool>,
    pub count_from: Option<u64>,
    pub count_from_input: Option<bool>,
    #[serde(skip)]
    pub on_tick: Option<OnTick>,
}

impl Options {
    /// The registry's starting defaults.
    #[must_use]
    pub const fn defaults() -> Self {
        Self {
            auto_start: Some(true),
            count_from: Some(0),
            count_from_input: Some(true),
            on_tick: None,
        }
    }

    pub fn merge(&mut self, overrides: &Overrides) {
        overrides.auto_start.apply(&mut self.auto_start);
        overrides.count_from.apply(&mut self.count_from);
        overrides.count_from_input.apply(&mut self.count_from_input);
        overrides.on_tick.apply(&mut self.on_tick);
    }

    #[must_use]
    pub fn merged(mut self, overrides: &Overrides) -> Self {
        self.merge(overrides);
        self
    }

    /// Turn this layer into overrides that set every present field.
    #[must_use]
    pub fn to_overrides(&self) -> Overrides {
        Overrides {
            auto_start: self.auto_start.map_or(Setting::Keep, Setting::Set),
            count_from: self.count_from.map_or(Setting::Keep, Setting::Set),
            count_from_input: self
                .count_from_input
                .map_or(Setting::Keep, Setting::Set),
            on_tick: self.on_tick.clone().map_or(Setting::Keep, Setting::Set),
        }
    }

    #[must_use]
    pub fn auto_start(&self, defaults: &Self) -> bool {
        self.auto_start.or(defaults.auto_start).unwrap_or(false)
    }

    #[must_use]
    pub fn count_from(&self, defaults: &Self) -> u64 {
        self.count_from.or(defaults.count_from).unwrap_or(0)
    }

    #[must_use]
    pub fn count_from_input(&self, defaults: &Self) -> bool {
        self.count_from_input
            .or(defaults.count_from_input)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn on_tick(&self, defaults: &Self) -> Option<OnTick> {
        self.on_tick.clone().or_else(|| defaults.on_tick.clone())
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("auto_start", &self.auto_start)
            .field("count_from", &self.count_from)
            .field("count_from_input", &self.count_from_input)
            .field("on_tick", &self.on_tick.as_ref().map(|_| ".."))
            .finish()
    }
}
