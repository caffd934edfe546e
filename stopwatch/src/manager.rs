use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    duration::{Units, format_duration, parse_duration},
    error::StopwatchError,
    instance::{Instance, InstanceId, RunState},
    settings::{Options, Overrides},
    surface::{ControlState, ElementId, Surface},
};

/// Delay between two redisplays of a running stopwatch.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest tick interval a manager accepts.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Named operations callers can apply uniformly to a set of elements.
#[derive(Debug, Clone)]
pub enum Command {
    Attach(Overrides),
    Start,
    Pause,
    Destroy,
}

/// User interaction reported by the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A toggle control was clicked.
    Click(ElementId),
    /// An element received focus.
    Focus(ElementId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub id: InstanceId,
    pub target: ElementId,
    pub control: Option<ElementId>,
    pub state: RunState,
    pub display: String,
    pub accumulated_ms: i64,
}

/// Registry of stopwatch instances for one page.
///
/// The manager is the only owner of its instances. Which elements carry a
/// stopwatch is answered by the `targets` table alone, never by the page.
pub struct Manager<S, C> {
    surface: S,
    clock: C,
    next_id: u64,
    instances: HashMap<InstanceId, Instance>,
    targets: HashMap<ElementId, InstanceId>,
    controls: HashMap<ElementId, InstanceId>,
    focus: HashMap<ElementId, ElementId>,
    defaults: Options,
    tick_interval: Duration,
}

impl<S: Surface, C: Clock> Manager<S, C> {
    pub fn new(surface: S, clock: C) -> Self {
        Self {
            surface,
            clock,
            next_id: 0,
            instances: HashMap::new(),
            targets: HashMap::new(),
            controls: HashMap::new(),
            focus: HashMap::new(),
            defaults: Options::defaults(),
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Intervals below [`MIN_TICK_INTERVAL`] are raised to it.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        if interval < MIN_TICK_INTERVAL {
            warn!(
                "tick interval {:?} too short, using {:?}",
                interval, MIN_TICK_INTERVAL
            );
        }
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
        self
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub const fn defaults(&self) -> &Options {
        &self.defaults
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn is_attached(&self, target: ElementId) -> bool {
        self.targets.contains_key(&target)
    }

    /// Store a new instance under the next free id.
    pub fn register(&mut self, target: ElementId, options: Options) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.insert(id, Instance::new(id, target, options));
        id
    }

    /// # Errors
    ///
    /// `StopwatchError::NotFound` if no instance has this id.
    pub fn get(&self, id: InstanceId) -> Result<&Instance, StopwatchError> {
        self.instances.get(&id).ok_or(StopwatchError::NotFound(id))
    }

    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if the element has no stopwatch.
    pub fn instance_for(
        &self,
        target: ElementId,
    ) -> Result<&Instance, StopwatchError> {
        self.get(self.lookup(target)?)
    }

    /// Merge `overrides` into the defaults every instance falls back to.
    pub fn set_defaults(&mut self, overrides: &Overrides) {
        self.defaults.merge(overrides);
        debug!("stopwatch defaults now {:?}", self.defaults);
    }

    /// Attach a stopwatch to `target`, wiring up its toggle control.
    ///
    /// # Errors
    ///
    /// `StopwatchError::AlreadyAttached` if `target` already has one, or
    /// `StopwatchError::NoSuchElement` if the surface has no such element.
    pub fn attach(
        &mut self,
        target: ElementId,
        overrides: &Overrides,
    ) -> Result<InstanceId, StopwatchError> {
        if self.is_attached(target) {
            return Err(StopwatchError::AlreadyAttached(target));
        }
        if !self.surface.contains(target) {
            return Err(StopwatchError::NoSuchElement(target));
        }

        let options = Options::default().merged(overrides);
        let auto_start = options.auto_start(&self.defaults);
        let count_from_input = options.count_from_input(&self.defaults);

        let id = self.register(target, options);
        self.targets.insert(target, id);

        let state = if auto_start {
            ControlState::Pause
        } else {
            ControlState::Resume
        };
        let control = self.surface.insert_control(target, state);
        self.controls.insert(control, id);

        let seed = if count_from_input {
            self.displayed_seconds(target)
        } else {
            None
        };

        let instance = self.instance_mut(id)?;
        instance.set_control(control);
        if let Some(seconds) = seed.filter(|s| *s > 0) {
            instance.set_count_from(seconds);
        }

        info!("attached stopwatch {} to {}", id, target);

        if auto_start {
            self.start_instance(id, false)?;
        }

        Ok(id)
    }

    /// Start or resume the stopwatch on `target`.
    ///
    /// If the display was edited while paused, the edited value wins.
    ///
    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if the element has no stopwatch.
    pub fn start(&mut self, target: ElementId) -> Result<(), StopwatchError> {
        let id = self.lookup(target)?;
        self.start_instance(id, true)?;
        self.show_control(id, ControlState::Pause)
    }

    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if the element has no stopwatch.
    pub fn pause(&mut self, target: ElementId) -> Result<(), StopwatchError> {
        let id = self.lookup(target)?;
        self.pause_instance(id)?;
        self.show_control(id, ControlState::Resume)
    }

    /// Detach the stopwatch from `target`, removing its control and
    /// cancelling its pending tick.
    ///
    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if the element has no stopwatch.
    pub fn destroy(&mut self, target: ElementId) -> Result<(), StopwatchError> {
        let id = self
            .targets
            .remove(&target)
            .ok_or(StopwatchError::NotAttached(target))?;
        let mut instance =
            self.instances.remove(&id).ok_or(StopwatchError::NotFound(id))?;

        instance.cancel();
        if let Some(control) = instance.take_control() {
            self.controls.remove(&control);
            self.surface.remove_control(control);
        }
        self.focus.retain(|_, bound| *bound != target);
        self.surface.clear(target);

        info!("destroyed stopwatch {} on {}", id, target);
        Ok(())
    }

    /// Flip the stopwatch owning `control` between running and paused.
    ///
    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if `control` is not a stopwatch control.
    pub fn toggle(&mut self, control: ElementId) -> Result<(), StopwatchError> {
        let id = *self
            .controls
            .get(&control)
            .ok_or(StopwatchError::NotAttached(control))?;

        if self.get(id)?.is_running() {
            self.pause_instance(id)?;
            self.show_control(id, ControlState::Resume)
        } else {
            self.start_instance(id, true)?;
            self.show_control(id, ControlState::Pause)
        }
    }

    /// Pause the stopwatch on `target` whenever `element` gains focus.
    ///
    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if `target` has no stopwatch.
    pub fn pause_on_focus(
        &mut self,
        element: ElementId,
        target: ElementId,
    ) -> Result<(), StopwatchError> {
        self.lookup(target)?;
        self.focus.insert(element, target);
        Ok(())
    }

    /// Redisplay the instance and, while it runs, schedule the next tick.
    ///
    /// # Errors
    ///
    /// `StopwatchError::NotFound` if no instance has this id.
    pub fn update(&mut self, id: InstanceId) -> Result<Units, StopwatchError> {
        let units = self.render(id)?;
        let next = self.clock.now() + self.tick_interval;
        let instance = self.instance_mut(id)?;
        if instance.is_running() {
            instance.schedule(next);
        }
        Ok(units)
    }

    /// Run a command against `target`. Failures are logged and dropped.
    pub fn dispatch(&mut self, target: ElementId, command: Command) {
        let result = match command {
            Command::Attach(overrides) => {
                self.attach(target, &overrides).map(|_| ())
            }
            Command::Start => self.start(target),
            Command::Pause => self.pause(target),
            Command::Destroy => self.destroy(target),
        };
        if let Err(e) = result {
            debug!("ignoring stopwatch command on {}: {}", target, e);
        }
    }

    /// Run the same command against every target in turn.
    pub fn dispatch_all<I>(&mut self, targets: I, command: &Command)
    where
        I: IntoIterator<Item = ElementId>,
    {
        for target in targets {
            self.dispatch(target, command.clone());
        }
    }

    /// React to a click or focus. Failures are logged and dropped.
    pub fn handle_event(&mut self, event: Event) {
        let result = match event {
            Event::Click(control) => self.toggle(control),
            Event::Focus(element) => {
                let target = if self.is_attached(element) {
                    Some(element)
                } else {
                    self.focus.get(&element).copied()
                };
                match target {
                    Some(target) => self.pause(target),
                    None => Err(StopwatchError::NotAttached(element)),
                }
            }
        };
        if let Err(e) = result {
            debug!("ignoring stopwatch event {:?}: {}", event, e);
        }
    }

    /// Earliest pending tick across all instances.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.instances.values().filter_map(Instance::pending).min()
    }

    /// Fire every tick that is due, oldest first. Returns how many ran.
    pub fn run_due(&mut self) -> usize {
        let now = self.clock.now();
        let mut due: Vec<(Instant, InstanceId)> = self
            .instances
            .values()
            .filter_map(|i| i.pending().filter(|at| *at <= now).map(|at| (at, i.id())))
            .collect();
        due.sort_unstable();

        let mut fired = 0;
        for (_, id) in due {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            instance.cancel();
            if instance.is_running() && self.update(id).is_ok() {
                fired += 1;
            }
        }
        fired
    }

    /// # Errors
    ///
    /// `StopwatchError::NotAttached` if the element has no stopwatch.
    pub fn snapshot(&self, target: ElementId) -> Result<Snapshot, StopwatchError> {
        let instance = self.instance_for(target)?;
        Ok(Snapshot {
            id: instance.id(),
            target,
            control: instance.control(),
            state: instance.state(),
            display: instance.display(self.clock.now(), &self.defaults),
            accumulated_ms: instance.accumulated_ms(),
        })
    }

    fn lookup(&self, target: ElementId) -> Result<InstanceId, StopwatchError> {
        self.targets
            .get(&target)
            .copied()
            .ok_or(StopwatchError::NotAttached(target))
    }

    fn instance_mut(
        &mut self,
        id: InstanceId,
    ) -> Result<&mut Instance, StopwatchError> {
        self.instances.get_mut(&id).ok_or(StopwatchError::NotFound(id))
    }

    fn displayed_seconds(&self, target: ElementId) -> Option<u64> {
        let text = self.surface.value(target)?;
        if text.is_empty() {
            return None;
        }
        parse_duration(&text)
            .inspect_err(|e| debug!("not using display of {}: {}", target, e))
            .ok()
    }

    fn start_instance(
        &mut self,
        id: InstanceId,
        reconcile: bool,
    ) -> Result<(), StopwatchError> {
        let target = self.get(id)?.target();
        if self.get(id)?.is_running() {
            return Ok(());
        }

        let displayed = if reconcile {
            self.displayed_seconds(target)
        } else {
            None
        };

        let now = self.clock.now();
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(StopwatchError::NotFound(id))?;
        if let Some(seconds) = displayed {
            if instance.reconcile(seconds, &self.defaults) {
                debug!("display of stopwatch {} edited to {}s", id, seconds);
            }
        }
        instance.resume(now);

        self.update(id)?;
        Ok(())
    }

    fn pause_instance(&mut self, id: InstanceId) -> Result<(), StopwatchError> {
        let now = self.clock.now();
        if self.instance_mut(id)?.pause(now) {
            self.render(id)?;
        }
        Ok(())
    }

    fn render(&mut self, id: InstanceId) -> Result<Units, StopwatchError> {
        let now = self.clock.now();
        let instance = self.instances.get(&id).ok_or(StopwatchError::NotFound(id))?;
        let units = instance.elapsed_units(now, &self.defaults);

        self.surface
            .set_value(instance.target(), &format_duration(units));
        if let Some(on_tick) = instance.options().on_tick(&self.defaults) {
            on_tick(instance, units, &mut self.surface);
        }
        Ok(units)
    }

    fn show_control(
        &mut self,
        id: InstanceId,
        state: ControlState,
    ) -> Result<(), StopwatchError> {
        if let Some(control) = self.get(id)?.control() {
            self.surface.update_control(control, state);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{clock::ManualClock, settings::Setting, surface::Page};

    fn setup(initial: &str) -> (Manager<Page, ManualClock>, ManualClock, ElementId) {
        let clock = ManualClock::new();
        let mut page = Page::new();
        let target = page.add_input(initial);
        (Manager::new(page, clock.clone()), clock, target)
    }

    fn value(manager: &Manager<Page, ManualClock>, target: ElementId) -> String {
        manager.surface().value(target).unwrap()
    }

    fn advance(manager: &mut Manager<Page, ManualClock>, clock: &ManualClock, by: Duration) {
        clock.advance(by);
        manager.run_due();
    }

    fn counting(calls: &Arc<AtomicUsize>) -> Overrides {
        let calls = Arc::clone(calls);
        Overrides::new().on_tick(move |_, _, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_attach_autostarts_and_renders() {
        let (mut manager, _clock, target) = setup("");

        let id = manager.attach(target, &Overrides::new()).unwrap();

        assert_eq!(id, InstanceId(0));
        assert_eq!(value(&manager, target), "00:00:00");
        assert_eq!(manager.get(id).unwrap().state(), RunState::Running);
        let control = manager.get(id).unwrap().control().unwrap();
        assert_eq!(manager.surface().next_sibling(target), Some(control));
        assert_eq!(manager.surface().element(control).unwrap().text, "Pause");
    }

    #[test]
    fn test_count_from_then_pause_after_five_seconds() {
        let (mut manager, clock, target) = setup("");
        manager
            .attach(target, &Overrides::new().count_from(10))
            .unwrap();

        advance(&mut manager, &clock, Duration::from_secs(5));
        manager.pause(target).unwrap();

        let instance = manager.instance_for(target).unwrap();
        let units = instance.elapsed_units(clock.now(), manager.defaults());
        assert_eq!(units, Units::from_seconds(15));
        assert_eq!(value(&manager, target), "00:00:15");
        assert_eq!(manager.snapshot(target).unwrap().state, RunState::Paused);
    }

    #[test]
    fn test_resume_adopts_edited_display() {
        let (mut manager, clock, target) = setup("");
        manager
            .attach(target, &Overrides::new().count_from(10))
            .unwrap();
        advance(&mut manager, &clock, Duration::from_secs(5));
        manager.pause(target).unwrap();

        manager.surface_mut().set_value(target, "00:00:50");
        manager.start(target).unwrap();
        assert_eq!(value(&manager, target), "00:00:50");

        advance(&mut manager, &clock, Duration::from_secs(2));
        assert_eq!(value(&manager, target), "00:00:52");
    }

    #[test]
    fn test_resume_with_untouched_display_keeps_time() {
        let (mut manager, clock, target) = setup("");
        manager
            .attach(target, &Overrides::new().count_from(10))
            .unwrap();
        advance(&mut manager, &clock, Duration::from_millis(5300));
        manager.pause(target).unwrap();

        clock.advance(Duration::from_secs(30));
        manager.start(target).unwrap();
        advance(&mut manager, &clock, Duration::from_millis(700));

        assert_eq!(value(&manager, target), "00:00:16");
    }

    #[test]
    fn test_unparseable_display_is_ignored_on_resume() {
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &Overrides::new()).unwrap();
        advance(&mut manager, &clock, Duration::from_secs(3));
        manager.pause(target).unwrap();

        manager.surface_mut().set_value(target, "soon");
        manager.start(target).unwrap();

        assert_eq!(value(&manager, target), "00:00:03");
    }

    #[test]
    fn test_destroy_cancels_pending_tick() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &counting(&calls)).unwrap();
        advance(&mut manager, &clock, Duration::from_millis(500));
        let control = manager.instance_for(target).unwrap().control().unwrap();

        manager.destroy(target).unwrap();
        let before = calls.load(Ordering::SeqCst);
        for _ in 0..6 {
            advance(&mut manager, &clock, TICK_INTERVAL);
        }

        assert_eq!(calls.load(Ordering::SeqCst), before);
        assert_eq!(manager.next_deadline(), None);
        assert!(manager.is_empty());
        assert!(!manager.is_attached(target));
        assert!(manager.surface().element(control).is_none());
        assert_eq!(value(&manager, target), "");
    }

    #[test]
    fn test_attach_twice_is_rejected() {
        let (mut manager, _clock, target) = setup("");
        manager.attach(target, &Overrides::new()).unwrap();

        let second = manager.attach(target, &Overrides::new());

        assert_eq!(second, Err(StopwatchError::AlreadyAttached(target)));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.surface().buttons().len(), 1);
    }

    #[test]
    fn test_dispatch_absorbs_errors() {
        let (mut manager, _clock, target) = setup("");
        let stranger = ElementId(99);

        manager.dispatch(stranger, Command::Pause);
        manager.dispatch(stranger, Command::Start);
        manager.dispatch(stranger, Command::Destroy);
        manager.dispatch(target, Command::Attach(Overrides::new()));
        manager.dispatch(target, Command::Attach(Overrides::new()));

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.surface().buttons().len(), 1);
    }

    #[test]
    fn test_attach_to_missing_element_is_rejected() {
        let clock = ManualClock::new();
        let mut manager = Manager::new(Page::new(), clock.clone());
        let ghost = ElementId(42);

        let result = manager.attach(ghost, &Overrides::new());

        assert_eq!(result, Err(StopwatchError::NoSuchElement(ghost)));
        assert!(manager.is_empty());
        assert!(!manager.is_attached(ghost));
        assert!(manager.surface().buttons().is_empty());
        assert_eq!(manager.next_deadline(), None);
        clock.advance(Duration::from_secs(1));
        assert_eq!(manager.run_due(), 0);

        manager.dispatch(ghost, Command::Attach(Overrides::new()));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_dispatch_all_reaches_every_target() {
        let (mut manager, _clock, first) = setup("");
        let second = manager.surface_mut().add_input("");
        let targets = [first, second, ElementId(77)];

        manager.dispatch_all(targets, &Command::Attach(Overrides::new()));
        assert_eq!(manager.len(), 2);

        manager.dispatch_all(targets, &Command::Pause);
        assert_eq!(manager.snapshot(first).unwrap().state, RunState::Paused);
        assert_eq!(manager.snapshot(second).unwrap().state, RunState::Paused);

        manager.dispatch_all(targets, &Command::Destroy);
        assert!(manager.is_empty());
        assert!(manager.surface().buttons().is_empty());
    }

    #[test]
    fn test_zero_tick_interval_is_raised() {
        let clock = ManualClock::new();
        let mut page = Page::new();
        let target = page.add_input("");
        let mut manager = Manager::new(page, clock.clone())
            .with_tick_interval(Duration::ZERO);

        manager.attach(target, &Overrides::new()).unwrap();

        assert_eq!(
            manager.next_deadline(),
            Some(clock.now() + MIN_TICK_INTERVAL)
        );
        assert_eq!(manager.run_due(), 0);
    }

    #[test]
    fn test_snapshot_of_unattached_element() {
        let (manager, _clock, target) = setup("");

        assert_eq!(
            manager.snapshot(target),
            Err(StopwatchError::NotAttached(target))
        );
    }

    #[test]
    fn test_get_unknown_id_is_not_found() {
        let (manager, _clock, _target) = setup("");

        assert!(matches!(
            manager.get(InstanceId(4)),
            Err(StopwatchError::NotFound(InstanceId(4)))
        ));
    }

    #[test]
    fn test_only_running_instances_hold_a_tick() {
        let (mut manager, clock, target) = setup("");
        manager
            .attach(target, &Overrides::new().auto_start(false))
            .unwrap();
        assert_eq!(manager.next_deadline(), None);
        assert_eq!(value(&manager, target), "");

        manager.start(target).unwrap();
        assert_eq!(manager.next_deadline(), Some(clock.now() + TICK_INTERVAL));

        manager.pause(target).unwrap();
        assert_eq!(manager.next_deadline(), None);
    }

    #[test]
    fn test_paused_display_stays_put() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &counting(&calls)).unwrap();
        advance(&mut manager, &clock, Duration::from_secs(2));
        manager.pause(target).unwrap();
        let after_pause = calls.load(Ordering::SeqCst);

        for _ in 0..10 {
            advance(&mut manager, &clock, TICK_INTERVAL);
        }

        assert_eq!(calls.load(Ordering::SeqCst), after_pause);
        assert_eq!(value(&manager, target), "00:00:02");
    }

    #[test]
    fn test_start_and_pause_are_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &counting(&calls)).unwrap();

        manager.start(target).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        manager.pause(target).unwrap();
        manager.pause(target).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.snapshot(target).unwrap().accumulated_ms, 1000);
    }

    #[test]
    fn test_ticks_every_interval_while_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &counting(&calls)).unwrap();

        for _ in 0..4 {
            advance(&mut manager, &clock, TICK_INTERVAL);
        }

        // one render on attach plus four ticks
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(value(&manager, target), "00:00:02");
    }

    #[test]
    fn test_tick_waits_for_its_deadline() {
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &Overrides::new()).unwrap();

        clock.advance(Duration::from_millis(499));
        assert_eq!(manager.run_due(), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(manager.run_due(), 1);
    }

    #[test]
    fn test_count_from_input_seeds_from_display() {
        let (mut manager, clock, target) = setup("1:00:00");
        manager.attach(target, &Overrides::new()).unwrap();
        assert_eq!(value(&manager, target), "01:00:00");

        advance(&mut manager, &clock, Duration::from_secs(1));
        assert_eq!(value(&manager, target), "01:00:01");
    }

    #[test]
    fn test_count_from_input_disabled_ignores_display() {
        let (mut manager, _clock, target) = setup("00:05:00");
        manager
            .attach(target, &Overrides::new().count_from_input(false))
            .unwrap();

        assert_eq!(value(&manager, target), "00:00:00");
    }

    #[test]
    fn test_invalid_seed_falls_back_to_count_from() {
        let (mut manager, _clock, target) = setup("later");
        manager
            .attach(target, &Overrides::new().count_from(90))
            .unwrap();

        assert_eq!(value(&manager, target), "00:01:30");
    }

    #[test]
    fn test_click_toggles_control() {
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &Overrides::new()).unwrap();
        let control = manager.instance_for(target).unwrap().control().unwrap();

        manager.handle_event(Event::Click(control));
        let button = manager.surface().element(control).unwrap();
        assert_eq!(button.text, "Resume");
        assert!(button.has_class("sw-resume"));
        assert_eq!(manager.snapshot(target).unwrap().state, RunState::Paused);

        clock.advance(Duration::from_secs(1));
        manager.handle_event(Event::Click(control));
        let button = manager.surface().element(control).unwrap();
        assert_eq!(button.text, "Pause");
        assert!(button.has_class("sw-pause"));
        assert_eq!(manager.snapshot(target).unwrap().state, RunState::Running);
    }

    #[test]
    fn test_attach_paused_shows_resume() {
        let (mut manager, _clock, target) = setup("");
        let id = manager
            .attach(target, &Overrides::new().auto_start(false))
            .unwrap();

        let control = manager.get(id).unwrap().control().unwrap();
        let button = manager.surface().element(control).unwrap();
        assert_eq!(button.text, "Resume");
        assert!(button.has_class("sw-resume"));
    }

    #[test]
    fn test_focus_pauses() {
        let (mut manager, clock, target) = setup("");
        manager.attach(target, &Overrides::new()).unwrap();
        clock.advance(Duration::from_secs(1));

        manager.handle_event(Event::Focus(target));

        assert_eq!(manager.snapshot(target).unwrap().state, RunState::Paused);
        let control = manager.instance_for(target).unwrap().control().unwrap();
        assert_eq!(manager.surface().element(control).unwrap().text, "Resume");
    }

    #[test]
    fn test_focus_on_bound_element_pauses() {
        let (mut manager, _clock, target) = setup("");
        let other = manager.surface_mut().add_input("");
        manager.attach(target, &Overrides::new()).unwrap();
        manager.pause_on_focus(other, target).unwrap();

        manager.handle_event(Event::Focus(other));

        assert_eq!(manager.snapshot(target).unwrap().state, RunState::Paused);
    }

    #[test]
    fn test_focus_on_unattached_element_is_ignored() {
        let (mut manager, _clock, target) = setup("12");

        manager.handle_event(Event::Focus(target));
        manager.handle_event(Event::Click(target));

        assert!(manager.is_empty());
        assert_eq!(value(&manager, target), "12");
    }

    #[test]
    fn test_set_defaults_applies_to_new_instances() {
        let (mut manager, _clock, target) = setup("");
        manager.set_defaults(&Overrides::new().auto_start(false));

        manager.attach(target, &Overrides::new()).unwrap();

        assert_eq!(manager.snapshot(target).unwrap().state, RunState::Paused);
    }

    #[test]
    fn test_unset_default_falls_back_to_off() {
        let (mut manager, _clock, target) = setup("00:10:00");
        manager.set_defaults(&Overrides {
            count_from_input: Setting::Unset,
            ..Overrides::new()
        });

        manager.attach(target, &Overrides::new()).unwrap();

        assert_eq!(manager.defaults().count_from_input, None);
        assert_eq!(value(&manager, target), "00:00:00");
    }

    #[test]
    fn test_ticks_run_in_deadline_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let clock = ManualClock::new();
        let mut page = Page::new();
        let first = page.add_input("");
        let second = page.add_input("");
        let mut manager = Manager::new(page, clock.clone());
        let record = {
            let order = Arc::clone(&order);
            Overrides::new().on_tick(move |instance, _, _| {
                order.lock().unwrap().push(instance.id());
            })
        };

        let b = manager.attach(second, &record).unwrap();
        clock.advance(Duration::from_millis(100));
        let a = manager.attach(first, &record).unwrap();
        order.lock().unwrap().clear();
        clock.advance(Duration::from_secs(1));

        assert_eq!(manager.run_due(), 2);
        assert_eq!(*order.lock().unwrap(), vec![b, a]);
    }
}
