//! Image load-status tracking.
//!
//! One [`StatusTracker`] follows one mounted `<img>`. It never touches the
//! document itself: the host hands it an [`ImageElement`] to inspect, executes
//! the [`Command`]s it returns, and delivers the resulting browser callbacks
//! back as [`ElementEvent`]s tagged with the [`Cycle`] that requested them.
//!
//! ## Cycles
//!
//! Each source value gets its own cycle. Starting a new cycle (or unmounting)
//! first releases the previous cycle's observer and listeners, and any event
//! still in flight for an older cycle is dropped on arrival. A slow image
//! that finishes after its picture moved on can never report into the new
//! cycle.
//!
//! ```text
//!            placeholder in src            attributes changed
//!   Idle ───────────────────────▶ (observe) ──────────────────▶ Loading ──▶ Success
//!    │                                                            │     └─▶ Failure
//!    │ real src, not complete ────────────────────────────────────┘
//!    └ real src, complete ─────────────────────────────────────────────────▶ Success
//! ```
//!
//! ## Handler Indirection
//!
//! Status changes are reported through a [`StatusHandler`] cell. Rendering
//! rebinds the cell on every pass; the tracker reads through it when a
//! transition happens, so the callback that fires is always the latest one
//! even though the tracker itself survives re-renders.

use crate::image::IMAGE_PLACEHOLDER;
use crate::types::LoadStatus;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Attributes the lazy-load agent rewrites when it promotes a source.
pub const OBSERVED_ATTRIBUTES: &[&str] = &["src", "data-src"];

/// Read access to the live image element.
pub trait ImageElement {
    /// Current value of the `src` attribute as the browser resolved it.
    fn current_src(&self) -> Option<&str>;

    /// The element's `complete` flag.
    fn is_complete(&self) -> bool;
}

/// Identifies one tracking cycle of one mounted element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cycle(u64);

impl Cycle {
    pub fn id(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Cycle(self.0 + 1)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Work the host must perform on the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Watch the attributes for changes; report [`ElementEvent::AttributesChanged`].
    ObserveAttributes {
        cycle: Cycle,
        attributes: &'static [&'static str],
    },
    /// Stop the attribute observer of `cycle`.
    Disconnect { cycle: Cycle },
    /// Attach `load` and `error` listeners; report [`ElementEvent::Load`] / [`ElementEvent::Error`].
    Listen { cycle: Cycle },
    /// Remove the `load` and `error` listeners of `cycle`.
    Unlisten { cycle: Cycle },
    /// Report [`ElementEvent::Recheck`] once `delay` has elapsed.
    ScheduleRecheck { cycle: Cycle, delay: Duration },
    /// Put the placeholder back in `src` and mark the element for the
    /// lazy-load agent again.
    RearmLazy,
}

/// Browser callbacks, as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementEvent {
    AttributesChanged,
    Load,
    Error,
    Recheck,
}

/// Callback invoked with every status transition.
#[derive(Clone)]
pub struct OnStatusChange(Rc<dyn Fn(LoadStatus)>);

impl OnStatusChange {
    pub fn new(f: impl Fn(LoadStatus) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, status: LoadStatus) {
        (self.0)(status)
    }
}

impl fmt::Debug for OnStatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnStatusChange(..)")
    }
}

/// Mutable cell holding the latest status callback.
#[derive(Debug, Clone, Default)]
pub struct StatusHandler(Rc<RefCell<Option<OnStatusChange>>>);

impl StatusHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the callback. Existing observers pick up the new one.
    pub fn bind(&self, callback: Option<OnStatusChange>) {
        *self.0.borrow_mut() = callback;
    }

    pub fn is_bound(&self) -> bool {
        self.0.borrow().is_some()
    }

    fn notify(&self, status: LoadStatus) {
        // Clone out so the callback may rebind this cell.
        let callback = self.0.borrow().clone();
        if let Some(callback) = callback {
            callback.call(status);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No cycle, or a cycle with nothing to watch.
    Detached,
    /// Placeholder in `src`; waiting for the lazy-load agent.
    AwaitingSwap,
    /// Real `src`; waiting for `load` or `error`.
    AwaitingLoad,
    Settled,
}

/// Load-status state machine for one mounted element.
#[derive(Debug)]
pub struct StatusTracker {
    status: LoadStatus,
    cycle: Cycle,
    phase: Phase,
    source: Option<String>,
    mounted: bool,
    observing: bool,
    listening: bool,
    recheck_delay: Duration,
    handler: StatusHandler,
}

impl StatusTracker {
    pub fn new(recheck_delay: Duration) -> Self {
        Self {
            status: LoadStatus::Idle,
            cycle: Cycle::default(),
            phase: Phase::Detached,
            source: None,
            mounted: false,
            observing: false,
            listening: false,
            recheck_delay,
            handler: StatusHandler::new(),
        }
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The cell transitions are reported through.
    pub fn handler(&self) -> &StatusHandler {
        &self.handler
    }

    /// Bring tracking in line with the rendered element.
    ///
    /// Called after every render. Does nothing while `source` is unchanged;
    /// otherwise ends the previous cycle and starts a new one.
    pub fn sync(
        &mut self,
        source: Option<&str>,
        lazy: bool,
        element: &impl ImageElement,
    ) -> Vec<Command> {
        if self.mounted && self.source.as_deref() == source {
            return Vec::new();
        }

        let mut commands = self.release();
        // A promoted element still shows the previous source, whatever state
        // that source reached.
        let promoted = element
            .current_src()
            .is_some_and(|s| !s.is_empty() && s != IMAGE_PLACEHOLDER);
        let rearm = lazy && self.mounted && promoted;
        self.cycle = self.cycle.next();
        self.source = source.map(str::to_string);
        self.mounted = true;
        self.phase = Phase::Detached;
        tracing::debug!(cycle = %self.cycle, source = ?self.source, "starting status cycle");
        self.transition(LoadStatus::Idle);

        if rearm {
            commands.push(Command::RearmLazy);
        }

        let live_src = if rearm {
            Some(IMAGE_PLACEHOLDER)
        } else {
            element.current_src().filter(|s| !s.is_empty())
        };

        match live_src {
            Some(IMAGE_PLACEHOLDER) => {
                self.phase = Phase::AwaitingSwap;
                self.observing = true;
                commands.push(Command::ObserveAttributes {
                    cycle: self.cycle,
                    attributes: OBSERVED_ATTRIBUTES,
                });
                commands.push(Command::ScheduleRecheck {
                    cycle: self.cycle,
                    delay: self.recheck_delay,
                });
            }
            Some(_) if element.is_complete() => {
                self.phase = Phase::Settled;
                self.transition(LoadStatus::Success);
            }
            Some(_) => {
                self.transition(LoadStatus::Loading);
                self.await_load(&mut commands);
            }
            None => {}
        }
        commands
    }

    /// Feed a browser callback into the state machine.
    pub fn dispatch(
        &mut self,
        cycle: Cycle,
        event: ElementEvent,
        element: &impl ImageElement,
    ) -> Vec<Command> {
        if !self.mounted || cycle != self.cycle {
            tracing::trace!(%cycle, current = %self.cycle, ?event, "dropping stale event");
            return Vec::new();
        }

        let mut commands = Vec::new();
        match (self.phase, event) {
            (Phase::AwaitingSwap, ElementEvent::AttributesChanged) => {
                self.on_swapped(element, &mut commands);
            }
            (Phase::AwaitingSwap, ElementEvent::Recheck) => {
                let swapped = element
                    .current_src()
                    .is_some_and(|s| !s.is_empty() && s != IMAGE_PLACEHOLDER);
                if swapped {
                    self.on_swapped(element, &mut commands);
                } else {
                    tracing::trace!(%cycle, "still a placeholder after recheck");
                }
            }
            (Phase::AwaitingLoad, ElementEvent::Load) => {
                self.settle(LoadStatus::Success, &mut commands);
            }
            (Phase::AwaitingLoad, ElementEvent::Error) => {
                self.settle(LoadStatus::Failure, &mut commands);
            }
            _ => {}
        }
        commands
    }

    /// Stop tracking. Later events for any cycle are dropped.
    pub fn unmount(&mut self) -> Vec<Command> {
        let commands = self.release();
        self.mounted = false;
        self.phase = Phase::Detached;
        self.cycle = self.cycle.next();
        commands
    }

    fn on_swapped(&mut self, element: &impl ImageElement, commands: &mut Vec<Command>) {
        self.transition(LoadStatus::Loading);
        if self.observing {
            self.observing = false;
            commands.push(Command::Disconnect { cycle: self.cycle });
        }
        if element.is_complete() {
            self.phase = Phase::Settled;
            self.transition(LoadStatus::Success);
        } else {
            self.await_load(commands);
        }
    }

    fn await_load(&mut self, commands: &mut Vec<Command>) {
        self.phase = Phase::AwaitingLoad;
        self.listening = true;
        commands.push(Command::Listen { cycle: self.cycle });
    }

    fn settle(&mut self, status: LoadStatus, commands: &mut Vec<Command>) {
        self.phase = Phase::Settled;
        if self.listening {
            self.listening = false;
            commands.push(Command::Unlisten { cycle: self.cycle });
        }
        self.transition(status);
    }

    fn release(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.observing {
            self.observing = false;
            commands.push(Command::Disconnect { cycle: self.cycle });
        }
        if self.listening {
            self.listening = false;
            commands.push(Command::Unlisten { cycle: self.cycle });
        }
        commands
    }

    fn transition(&mut self, status: LoadStatus) {
        if self.status == status {
            return;
        }
        tracing::debug!(cycle = %self.cycle, from = %self.status, to = %status, "image status");
        self.status = status;
        self.handler.notify(status);
    }
}
