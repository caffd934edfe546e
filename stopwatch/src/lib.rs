//! Stopwatch widgets bound to text fields.
//!
//! A [`Manager`] keeps one [`Instance`] per attached element. Each instance
//! is either running or paused; while running it redraws its field every
//! [`TICK_INTERVAL`] as `HH:MM:SS` and calls its tick callback. Pausing
//! banks the elapsed time, and resuming picks up whatever the field shows
//! if it was edited in between.
//!
//! ```
//! use std::time::Duration;
//! use stopwatch::{Manager, ManualClock, Overrides, Page, Surface};
//!
//! let clock = ManualClock::new();
//! let mut page = Page::new();
//! let field = page.add_input("0:01:00");
//! let mut manager = Manager::new(page, clock.clone());
//!
//! manager.attach(field, &Overrides::new())?;
//! clock.advance(Duration::from_secs(2));
//! manager.run_due();
//!
//! assert_eq!(manager.surface().value(field).as_deref(), Some("00:01:02"));
//! # Ok::<(), stopwatch::StopwatchError>(())
//! ```
//!
//! For use from async code, [`StopwatchService`] runs a manager on its own
//! task and drives the ticks with tokio timers.

pub mod clock;
pub mod countdown;
pub mod duration;
pub mod error;
pub mod instance;
pub mod manager;
pub mod service;
pub mod settings;
pub mod surface;

pub use clock::{Clock, ManualClock, TokioClock};
pub use countdown::Countdown;
pub use duration::{Units, format_duration, parse_duration};
pub use error::StopwatchError;
pub use instance::{Instance, InstanceId, RunState};
pub use manager::{
    Command, Event, MIN_TICK_INTERVAL, Manager, Snapshot, TICK_INTERVAL,
};
pub use service::{Request, ServiceHandle, StopwatchService};
pub use settings::{OnTick, Options, Overrides, Setting};
pub use surface::{ControlState, ElementId, Page, Surface};
