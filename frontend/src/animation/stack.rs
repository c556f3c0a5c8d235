//! Card "deck" scrubbing.
//!
//! Cards start fanned out behind each other. As progress advances, the front
//! card lifts away while the next one rises into its place; each card starts
//! rising a little before the one ahead of it has finished leaving, so the
//! motion reads as one continuous shuffle. The last card only settles.
//!
//! Timeline units: with N cards there are N - 1 units. Card `i` leaves during
//! `[i, i + 1]` and settles during `[i - 1 + overlap, i]`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use web_sys::HtmlElement;
use yew::{Callback, NodeRef};

use super::error::MotionError;
use super::phase::header_opacity;
use super::progress::{Distance, ProgressConfig, ProgressDriver, ProgressSample};
use super::signals::{Signal, SignalBus};
use super::tween::{lerp, VisualState};
use super::viewport::ViewportClass;
use crate::config;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    pub class: ViewportClass,
    pub scale_step: f64,
    pub offset_step: f64,
    /// Pixels a leaving card travels upward.
    pub exit_travel: f64,
    pub exit_scale: f64,
    /// Fraction of a unit by which a card's rise overlaps the previous card's exit.
    pub overlap: f64,
    pub distance: Distance,
}

impl StackConfig {
    pub fn for_class(class: ViewportClass, viewport_height: f64) -> Self {
        match class {
            ViewportClass::Wide => Self {
                class,
                scale_step: config::STACK_WIDE_SCALE_STEP,
                offset_step: config::STACK_WIDE_OFFSET_STEP_PX,
                exit_travel: config::STACK_WIDE_EXIT_VIEWPORTS * viewport_height,
                exit_scale: config::STACK_EXIT_SCALE,
                overlap: config::STACK_OVERLAP,
                distance: Distance::ViewportHeights(1.0),
            },
            ViewportClass::Narrow => Self {
                class,
                scale_step: config::STACK_NARROW_SCALE_STEP,
                offset_step: config::STACK_NARROW_OFFSET_STEP_PX,
                exit_travel: config::STACK_NARROW_EXIT_VIEWPORTS * viewport_height,
                exit_scale: config::STACK_EXIT_SCALE,
                overlap: config::STACK_OVERLAP,
                distance: Distance::ViewportHeights(0.8),
            },
        }
    }

    /// Total scroll distance grows with the number of cards.
    pub fn progress_config(&self, card_count: usize) -> ProgressConfig {
        let units = card_count.saturating_sub(1).max(1) as f64;
        let distance = match self.distance {
            Distance::ViewportHeights(per_unit) => Distance::ViewportHeights(per_unit * units),
            Distance::Pixels(per_unit) => Distance::Pixels(per_unit * units),
        };
        ProgressConfig {
            start_fraction: config::STACK_START_FRACTION,
            distance,
            pin: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardSlot {
    pub order: usize,
    pub rest_scale: f64,
    pub rest_offset: f64,
    /// Distance covered during the card's own motion: the exit travel for
    /// leaving cards, the fan offset for the last card.
    pub travel_distance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardState {
    pub order: usize,
    pub scale: f64,
    pub offset: f64,
}

impl CardState {
    pub fn visual(&self) -> VisualState {
        VisualState {
            translate_y: self.offset,
            scale: self.scale,
            ..VisualState::SETTLED
        }
    }
}

fn unit_ramp(value: f64, from: f64, to: f64) -> f64 {
    ((value - from) / (to - from)).clamp(0.0, 1.0)
}

#[derive(Clone, Debug, PartialEq)]
pub struct StackTimeline {
    slots: Vec<CardSlot>,
    overlap: f64,
    exit_scale: f64,
}

impl StackTimeline {
    pub fn new(card_count: usize, config: &StackConfig) -> Result<Self, MotionError> {
        if card_count == 0 {
            return Err(MotionError::Empty("card stack"));
        }
        if !(config.exit_travel > 0.0) {
            return Err(MotionError::NonPositiveDistance(config.exit_travel));
        }
        let last = card_count - 1;
        let slots = (0..card_count)
            .map(|order| {
                let rest_offset = order as f64 * config.offset_step;
                CardSlot {
                    order,
                    rest_scale: (1.0 - order as f64 * config.scale_step).max(0.5),
                    rest_offset,
                    travel_distance: if order == last { rest_offset } else { config.exit_travel },
                }
            })
            .collect();
        Ok(Self {
            slots,
            overlap: config.overlap.clamp(0.0, 0.95),
            exit_scale: config.exit_scale,
        })
    }

    fn units(&self) -> f64 {
        self.slots.len().saturating_sub(1).max(1) as f64
    }

    /// Progress range over which card `order` rises into place.
    pub fn settle_window(&self, order: usize) -> Option<(f64, f64)> {
        if order == 0 || order >= self.slots.len() {
            return None;
        }
        let units = self.units();
        let start = order as f64 - 1.0 + self.overlap;
        Some((start / units, order as f64 / units))
    }

    /// Progress range over which card `order` leaves. The last card never does.
    pub fn exit_window(&self, order: usize) -> Option<(f64, f64)> {
        if order + 1 >= self.slots.len() {
            return None;
        }
        let units = self.units();
        Some((order as f64 / units, (order + 1) as f64 / units))
    }

    /// The fanned layout shown before any scrolling.
    pub fn initial_layout(&self) -> Vec<CardState> {
        self.evaluate(0.0)
    }

    pub fn evaluate(&self, progress: f64) -> Vec<CardState> {
        let progress = progress.clamp(0.0, 1.0);
        self.slots
            .iter()
            .map(|slot| {
                let settled = match self.settle_window(slot.order) {
                    Some((from, to)) => unit_ramp(progress, from, to),
                    None => 1.0,
                };
                let exited = match self.exit_window(slot.order) {
                    Some((from, to)) => unit_ramp(progress, from, to),
                    None => 0.0,
                };
                let mut scale = lerp(slot.rest_scale, 1.0, settled);
                let mut offset = lerp(slot.rest_offset, 0.0, settled);
                if exited > 0.0 {
                    scale = lerp(1.0, self.exit_scale, exited);
                    offset = -slot.travel_distance * exited;
                }
                CardState {
                    order: slot.order,
                    scale,
                    offset,
                }
            })
            .collect()
    }
}

/// What a single progress report may do to the stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StackStep {
    /// First report past zero: announce the primary reveal.
    pub announce: bool,
    pub drive_cards: bool,
}

/// The one-shot decisions of a stack: the fanned layout is written once,
/// activation is announced once, and cards only follow progress once unlocked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StackGate {
    layout_applied: bool,
    unlocked: bool,
    activation_sent: bool,
}

impl StackGate {
    pub fn needs_layout(&self) -> bool {
        !self.layout_applied
    }

    pub fn mark_layout_applied(&mut self) {
        self.layout_applied = true;
    }

    /// True the first time only.
    pub fn unlock(&mut self) -> bool {
        !std::mem::replace(&mut self.unlocked, true)
    }

    pub fn observe(&mut self, progress: f64) -> StackStep {
        let announce = progress > 0.0 && !self.activation_sent;
        if announce {
            self.activation_sent = true;
        }
        StackStep {
            announce,
            drive_cards: self.unlocked,
        }
    }
}

struct StackState {
    cards: Vec<NodeRef>,
    header: Option<NodeRef>,
    timeline: StackTimeline,
    driver: Option<ProgressDriver>,
    bus: SignalBus,
    gate: StackGate,
    disposed: bool,
}

/// Drives a card stack for one viewport class. Crossing the breakpoint means
/// tearing this down and building a new one.
#[derive(Clone)]
pub struct StackScrollController {
    state: Rc<RefCell<StackState>>,
}

impl StackScrollController {
    pub fn build(
        section: NodeRef,
        cards: Vec<NodeRef>,
        header: Option<NodeRef>,
        config: StackConfig,
        bus: SignalBus,
    ) -> Result<Self, MotionError> {
        let timeline = StackTimeline::new(cards.len(), &config)?;
        let controller = Self {
            state: Rc::new(RefCell::new(StackState {
                cards,
                header,
                timeline,
                driver: None,
                bus,
                gate: StackGate::default(),
                disposed: false,
            })),
        };
        controller.apply_initial_layout();

        let weak = Rc::downgrade(&controller.state);
        let card_count = controller.state.borrow().cards.len();
        let driver = ProgressDriver::attach(
            section,
            config.progress_config(card_count),
            Callback::from(move |sample: ProgressSample| Self::on_progress(&weak, sample)),
        );
        controller.state.borrow_mut().driver = Some(driver);
        info!("card stack built for {:?} with {} cards", config.class, card_count);
        Ok(controller)
    }

    /// Writes the fanned resting layout once. Later calls do nothing, and a
    /// call made before the cards mount is retried on the next progress report.
    pub fn apply_initial_layout(&self) {
        let mut state = self.state.borrow_mut();
        if !state.gate.needs_layout() || state.disposed {
            return;
        }
        let elements: Option<Vec<HtmlElement>> = state.cards.iter().map(|card| card.cast::<HtmlElement>()).collect();
        let Some(elements) = elements else {
            return;
        };
        let count = elements.len();
        for (element, card) in elements.iter().zip(state.timeline.initial_layout()) {
            card.visual().apply(element);
            let _ = element.style().set_property("z-index", &(count - card.order).to_string());
        }
        state.gate.mark_layout_applied();
    }

    /// Lets progress reach the cards. Until then they hold the fanned layout.
    pub fn unlock(&self) {
        let driver = {
            let mut state = self.state.borrow_mut();
            if state.disposed || !state.gate.unlock() {
                return;
            }
            state.driver.clone()
        };
        debug!("card stack unlocked");
        if let Some(driver) = driver {
            if let Some(sample) = driver.sample() {
                Self::on_progress(&Rc::downgrade(&self.state), sample);
            }
        }
    }

    /// Re-measures the section on the next frame, for layout shifts the driver
    /// cannot see on its own.
    pub fn refresh(&self) {
        let driver = self.state.borrow().driver.clone();
        if let Some(driver) = driver {
            driver.refresh();
        }
    }

    /// Releases the scroll binding and clears inline styles. Idempotent.
    pub fn teardown(&self) {
        let (driver, cards, header) = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            (state.driver.take(), state.cards.clone(), state.header.clone())
        };
        if let Some(driver) = driver {
            driver.dispose();
        }
        for element in cards.iter().chain(header.iter()).filter_map(|r| r.cast::<HtmlElement>()) {
            let style = element.style();
            let _ = style.remove_property("transform");
            let _ = style.remove_property("opacity");
            let _ = style.remove_property("z-index");
        }
        debug!("card stack torn down");
    }

    fn on_progress(weak: &Weak<RefCell<StackState>>, sample: ProgressSample) {
        let Some(state) = weak.upgrade() else {
            return;
        };
        if state.borrow().gate.needs_layout() {
            StackScrollController { state: state.clone() }.apply_initial_layout();
        }
        let publish = {
            let mut state = state.borrow_mut();
            if state.disposed {
                return;
            }
            let step = state.gate.observe(sample.progress);
            if let Some(header) = state.header.as_ref().and_then(|h| h.cast::<HtmlElement>()) {
                let _ = header
                    .style()
                    .set_property("opacity", &format!("{:.4}", header_opacity(sample.progress)));
            }
            if step.drive_cards {
                let cards = state.timeline.evaluate(sample.progress);
                for (node, card) in state.cards.iter().zip(cards) {
                    if let Some(element) = node.cast::<HtmlElement>() {
                        card.visual().apply(&element);
                    }
                }
            }
            step.announce.then(|| state.bus.clone())
        };
        if let Some(bus) = publish {
            info!("card stack entered, announcing primary reveal");
            bus.publish(Signal::PrimaryRevealStarted);
        }
    }
}
