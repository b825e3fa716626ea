//! Scripted browser host for mounted pictures.
//!
//! A scenario renders a picture, then plays the part of the browser and the
//! lazy-load agent step by step: promoting `data-src`, finishing or failing
//! the download, and letting the recheck delay elapse. The host executes
//! every [`Command`] the tracker returns against a [`SimulatedImage`] and
//! feeds browser callbacks back in, so a scenario file reproduces the exact
//! status sequence a page would report.
//!
//! Callbacks are queued and delivered at the end of each step. A step with
//! `defer = true` leaves its callbacks in flight until a later step ends,
//! which is how a scenario expresses "the image finished after the picture
//! was unmounted".
//!
//! ```toml
//! [picture]
//! alt = "Dunes"
//!
//! [[step]]
//! action = "render"
//! src = "dunes.jpg"
//!
//! [[step]]
//! action = "finish"
//! defer = true
//!
//! [[step]]
//! action = "unmount"
//! ```

use crate::image::{IMAGE_PLACEHOLDER, ImageProps, LAZY_CLASS, LAZY_LOADED_CLASS};
use crate::picture::{PictureInstance, PictureProps, PlainPicture};
use crate::status::{Command, Cycle, ElementEvent, ImageElement, OnStatusChange};
use crate::types::{LoadStatus, Loading};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("step {step} ({action}) needs a rendered picture")]
    NotRendered { step: usize, action: &'static str },
}

// ============================================================================
// Scenario file
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Render (or re-render) the picture. `src` overrides the base props.
    Render {
        src: Option<String>,
        #[serde(default)]
        lazy: bool,
        /// The browser already has the new source cached.
        #[serde(default)]
        cached: bool,
    },
    /// The lazy-load agent moves `data-src` into `src`.
    Promote,
    /// The current `src` finishes downloading.
    Finish,
    /// The current `src` fails to download.
    Fail,
    /// Every scheduled recheck fires.
    Elapse,
    Unmount,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Render { .. } => "render",
            Action::Promote => "promote",
            Action::Finish => "finish",
            Action::Fail => "fail",
            Action::Elapse => "elapse",
            Action::Unmount => "unmount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Keep this step's callbacks in flight.
    #[serde(default)]
    pub defer: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Base props every `render` step starts from.
    pub picture: PictureProps,
    #[serde(rename = "step")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self, SimulateError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, SimulateError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

// ============================================================================
// Simulated element
// ============================================================================

/// An `<img>` as the browser and the lazy-load agent see it.
///
/// Rendering only writes attributes whose rendered value changed since the
/// previous render, the way a DOM reconciler does. A lazy image that was
/// already promoted therefore keeps its old real `src` when only `data-src`
/// changes.
#[derive(Debug, Clone, Default)]
pub struct SimulatedImage {
    src: Option<String>,
    data_src: Option<String>,
    complete: bool,
    cached: bool,
    classes: Vec<String>,
    rendered_src: Option<String>,
    rendered_data_src: Option<String>,
    observing: Option<Cycle>,
    listening: Option<Cycle>,
    rechecks: Vec<Cycle>,
}

impl SimulatedImage {
    pub fn data_src(&self) -> Option<&str> {
        self.data_src.as_deref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_observed(&self) -> bool {
        self.observing.is_some()
    }

    pub fn is_listened(&self) -> bool {
        self.listening.is_some()
    }

    /// Reconcile with freshly rendered image props.
    pub fn render(&mut self, image: &ImageProps, cached: bool) {
        self.cached = cached;
        let live_src = image.live_src().map(str::to_string);
        if live_src != self.rendered_src {
            self.complete = live_src.as_deref() != Some(IMAGE_PLACEHOLDER) && cached;
            self.src = live_src.clone();
            self.rendered_src = live_src;
        }
        let data_src = image.loading.is_lazy().then(|| image.src.clone()).flatten();
        if data_src != self.rendered_data_src {
            self.data_src = data_src.clone();
            self.rendered_data_src = data_src;
        }
        if image.loading == Loading::Lazy {
            if !self.has_class(LAZY_CLASS) && !self.has_class(LAZY_LOADED_CLASS) {
                self.classes.push(LAZY_CLASS.to_string());
            }
        } else {
            self.classes.retain(|c| c != LAZY_CLASS && c != LAZY_LOADED_CLASS);
        }
    }

    /// Execute tracker commands.
    pub fn apply(&mut self, commands: &[Command]) {
        for command in commands {
            match *command {
                Command::ObserveAttributes { cycle, .. } => self.observing = Some(cycle),
                Command::Disconnect { cycle } => {
                    if self.observing == Some(cycle) {
                        self.observing = None;
                    }
                }
                Command::Listen { cycle } => self.listening = Some(cycle),
                Command::Unlisten { cycle } => {
                    if self.listening == Some(cycle) {
                        self.listening = None;
                    }
                }
                Command::ScheduleRecheck { cycle, .. } => self.rechecks.push(cycle),
                Command::RearmLazy => {
                    self.src = Some(IMAGE_PLACEHOLDER.to_string());
                    self.complete = false;
                    self.classes.retain(|c| c != LAZY_LOADED_CLASS);
                    if !self.has_class(LAZY_CLASS) {
                        self.classes.push(LAZY_CLASS.to_string());
                    }
                }
            }
        }
    }

    /// The lazy-load agent's swap. Nothing happens unless the element is
    /// marked for the agent.
    pub fn promote(&mut self) -> Vec<(Cycle, ElementEvent)> {
        if !self.has_class(LAZY_CLASS) {
            return Vec::new();
        }
        let Some(data_src) = self.data_src.clone() else {
            return Vec::new();
        };
        self.src = Some(data_src);
        self.complete = self.cached;
        self.classes.retain(|c| c != LAZY_CLASS);
        self.classes.push(LAZY_LOADED_CLASS.to_string());
        self.observing
            .map(|cycle| (cycle, ElementEvent::AttributesChanged))
            .into_iter()
            .collect()
    }

    pub fn finish(&mut self, ok: bool) -> Vec<(Cycle, ElementEvent)> {
        let real = self
            .src
            .as_deref()
            .is_some_and(|s| !s.is_empty() && s != IMAGE_PLACEHOLDER);
        if !real {
            return Vec::new();
        }
        self.complete = true;
        let event = if ok {
            ElementEvent::Load
        } else {
            ElementEvent::Error
        };
        self.listening.map(|cycle| (cycle, event)).into_iter().collect()
    }

    pub fn elapse(&mut self) -> Vec<(Cycle, ElementEvent)> {
        self.rechecks
            .drain(..)
            .map(|cycle| (cycle, ElementEvent::Recheck))
            .collect()
    }
}

impl ImageElement for SimulatedImage {
    fn current_src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}

// ============================================================================
// Runner
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub action: &'static str,
    pub cycle: u64,
    pub status: LoadStatus,
    pub commands: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Every status reported to the caller's callback, in order.
    pub statuses: Vec<LoadStatus>,
    pub steps: Vec<StepReport>,
    pub delivered: usize,
    /// Callbacks that arrived for a cycle that had already ended.
    pub dropped: usize,
}

impl SimulationReport {
    pub fn final_status(&self) -> LoadStatus {
        self.statuses.last().copied().unwrap_or_default()
    }
}

pub fn run_scenario(
    picture: &PlainPicture,
    scenario: &Scenario,
    recheck_delay: Duration,
) -> Result<SimulationReport, SimulateError> {
    let statuses = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&statuses);
    let callback = OnStatusChange::new(move |status| sink.borrow_mut().push(status));

    let mut instance = picture.mount(recheck_delay);
    let mut element: Option<SimulatedImage> = None;
    let mut queue: VecDeque<(Cycle, ElementEvent)> = VecDeque::new();
    let mut report = SimulationReport::default();

    for (index, step) in scenario.steps.iter().enumerate() {
        let step_number = index + 1;
        let not_rendered = || SimulateError::NotRendered {
            step: step_number,
            action: step.action.name(),
        };
        let mut commands = 0;

        match &step.action {
            Action::Render { src, lazy, cached } => {
                let mut props = scenario.picture.clone();
                if src.is_some() {
                    props.src = src.clone();
                }
                props.loading = if *lazy { Loading::Lazy } else { Loading::Eager };
                props.on_status_change = Some(callback.clone());

                instance.render(&props);
                let resolved = picture.resolve(&props);
                let el = element.get_or_insert_with(SimulatedImage::default);
                el.render(&resolved.image, *cached);
                let issued = instance.commit(&props, &*el);
                el.apply(&issued);
                commands += issued.len();
            }
            Action::Promote => queue.extend(element.as_mut().ok_or_else(not_rendered)?.promote()),
            Action::Finish => queue.extend(element.as_mut().ok_or_else(not_rendered)?.finish(true)),
            Action::Fail => queue.extend(element.as_mut().ok_or_else(not_rendered)?.finish(false)),
            Action::Elapse => queue.extend(element.as_mut().ok_or_else(not_rendered)?.elapse()),
            Action::Unmount => {
                let issued = instance.unmount();
                if let Some(mut el) = element.take() {
                    el.apply(&issued);
                }
                commands += issued.len();
            }
        }

        if !step.defer {
            commands += deliver(&mut instance, &mut element, &mut queue, &mut report);
        }
        tracing::debug!(step = step_number, action = step.action.name(), status = %instance.status(), "step done");
        report.steps.push(StepReport {
            action: step.action.name(),
            cycle: instance.cycle().id(),
            status: instance.status(),
            commands,
        });
    }
    deliver(&mut instance, &mut element, &mut queue, &mut report);

    report.statuses = statuses.borrow().clone();
    Ok(report)
}

/// Deliver queued callbacks; returns the number of commands they caused.
fn deliver(
    instance: &mut PictureInstance,
    element: &mut Option<SimulatedImage>,
    queue: &mut VecDeque<(Cycle, ElementEvent)>,
    report: &mut SimulationReport,
) -> usize {
    let detached = SimulatedImage::default();
    let mut issued_total = 0;
    while let Some((cycle, event)) = queue.pop_front() {
        if cycle == instance.cycle() {
            report.delivered += 1;
        } else {
            report.dropped += 1;
        }
        let issued = instance.dispatch(cycle, event, element.as_ref().unwrap_or(&detached));
        if let Some(el) = element.as_mut() {
            el.apply(&issued);
        }
        issued_total += issued.len();
    }
    issued_total
}
