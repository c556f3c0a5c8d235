//! Show/hide logic for the navbar.
//!
//! Nothing happens until the machine is activated by the card stack's one-shot
//! signal. Wide viewports follow landmarks only: hidden while the hero fills
//! the screen, shown once the second landmark scrolls in. Narrow viewports also
//! hide on downward scroll and show on upward scroll. For a short grace period
//! right after activation no rule fires, so the scroll that triggered
//! activation cannot immediately undo it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use web_sys::HtmlElement;
use yew::NodeRef;

use super::frame::FrameScheduler;
use super::signals::{Signal, SignalBus, Subscription};
use super::tween::{Easing, ElementAnimator, VisualState};
use super::viewport::{self, ViewportClass};
use crate::config;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Hidden,
    Visible,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    Idle,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Show,
    Hide,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisibilityConfig {
    pub noise_threshold_px: f64,
    pub min_hide_offset_px: f64,
    pub wide_primary_fraction: f64,
    pub narrow_primary_fraction: f64,
    pub grace_period_ms: u32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            noise_threshold_px: config::NAV_NOISE_THRESHOLD_PX,
            min_hide_offset_px: config::NAV_MIN_HIDE_OFFSET_PX,
            wide_primary_fraction: config::NAV_WIDE_PRIMARY_FRACTION,
            narrow_primary_fraction: config::NAV_NARROW_PRIMARY_FRACTION,
            grace_period_ms: config::NAV_GRACE_PERIOD_MS,
        }
    }
}

/// One coalesced scroll observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollObservation {
    pub scroll_y: f64,
    /// Share of the viewport covered by the primary landmark.
    pub primary_fraction: f64,
    pub secondary_visible: bool,
    pub class: ViewportClass,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityStateMachine {
    config: VisibilityConfig,
    state: Visibility,
    has_activated: bool,
    in_grace_period: bool,
    last_scroll_y: f64,
    direction: ScrollDirection,
}

impl VisibilityStateMachine {
    pub fn new(config: VisibilityConfig, initial_scroll_y: f64) -> Self {
        Self {
            config,
            state: Visibility::Hidden,
            has_activated: false,
            in_grace_period: false,
            last_scroll_y: initial_scroll_y,
            direction: ScrollDirection::Idle,
        }
    }

    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    /// Enables the rules, shows the element and opens the grace period. Only
    /// the first call does anything.
    pub fn activate(&mut self) -> Option<Transition> {
        if self.has_activated {
            return None;
        }
        self.has_activated = true;
        self.in_grace_period = true;
        self.transition_to(Visibility::Visible)
    }

    pub fn end_grace_period(&mut self) {
        self.in_grace_period = false;
    }

    pub fn observe(&mut self, observation: ScrollObservation) -> Option<Transition> {
        let delta = observation.scroll_y - self.last_scroll_y;
        let moved = delta.abs() > self.config.noise_threshold_px;
        if moved {
            self.direction = if delta > 0.0 { ScrollDirection::Down } else { ScrollDirection::Up };
            self.last_scroll_y = observation.scroll_y;
        }
        if !self.has_activated || self.in_grace_period {
            return None;
        }

        match observation.class {
            ViewportClass::Wide => {
                if observation.primary_fraction > self.config.wide_primary_fraction && !observation.secondary_visible {
                    self.transition_to(Visibility::Hidden)
                } else if observation.secondary_visible {
                    self.transition_to(Visibility::Visible)
                } else {
                    None
                }
            }
            ViewportClass::Narrow => {
                if observation.primary_fraction > self.config.narrow_primary_fraction {
                    return self.transition_to(Visibility::Hidden);
                }
                if !moved {
                    return None;
                }
                match self.direction {
                    ScrollDirection::Down if observation.scroll_y > self.config.min_hide_offset_px => {
                        self.transition_to(Visibility::Hidden)
                    }
                    ScrollDirection::Up => self.transition_to(Visibility::Visible),
                    _ => None,
                }
            }
        }
    }

    fn transition_to(&mut self, target: Visibility) -> Option<Transition> {
        if self.state == target {
            return None;
        }
        self.state = target;
        Some(match target {
            Visibility::Visible => Transition::Show,
            Visibility::Hidden => Transition::Hide,
        })
    }
}

struct NavState {
    machine: VisibilityStateMachine,
    animator: ElementAnimator,
    primary: NodeRef,
    secondary: NodeRef,
    scheduler: FrameScheduler,
    listeners: Vec<EventListener>,
    grace_timer: Option<Timeout>,
    subscription: Option<Subscription>,
    disposed: bool,
}

/// Binds a [`VisibilityStateMachine`] to a navbar element, the page scroll and
/// the activation signal.
#[derive(Clone)]
pub struct NavVisibilityController {
    state: Rc<RefCell<NavState>>,
}

impl NavVisibilityController {
    pub fn attach(nav: HtmlElement, primary: NodeRef, secondary: NodeRef, bus: &SignalBus) -> Self {
        let animator = ElementAnimator::new(nav, VisualState::hidden_at(config::NAV_HIDDEN_OFFSET_PX));
        animator.set_displayed(false);
        let controller = Self {
            state: Rc::new(RefCell::new(NavState {
                machine: VisibilityStateMachine::new(VisibilityConfig::default(), viewport::scroll_y()),
                animator,
                primary,
                secondary,
                scheduler: FrameScheduler::new(),
                listeners: Vec::new(),
                grace_timer: None,
                subscription: None,
                disposed: false,
            })),
        };

        // Subscribe before listening to scroll so activation is always seen
        // before the first rule evaluation.
        let weak = Rc::downgrade(&controller.state);
        let subscription = bus.subscribe(Signal::PrimaryRevealStarted, {
            let weak = weak.clone();
            move |_| Self::on_activation(&weak)
        });
        let scroll = web_sys::window().map(|window| {
            let weak = weak.clone();
            EventListener::new(&window, "scroll", move |_| Self::request_frame(&weak))
        });
        {
            let mut state = controller.state.borrow_mut();
            state.subscription = Some(subscription);
            state.listeners.extend(scroll);
        }
        controller
    }

    /// Removes listeners, the subscription and the grace timer. Idempotent.
    pub fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.listeners.clear();
        state.subscription = None;
        state.grace_timer = None;
        state.scheduler.cancel();
        state.animator.dispose();
        debug!("nav visibility disposed");
    }

    fn on_activation(weak: &Weak<RefCell<NavState>>) {
        let Some(strong) = weak.upgrade() else {
            return;
        };
        // An already-fired signal calls back from inside `subscribe`, before
        // `attach` stores the subscription; no borrow is held at that point.
        let mut state = strong.borrow_mut();
        if state.disposed {
            return;
        }
        let transition = state.machine.activate();
        let grace_ms = state.machine.config().grace_period_ms;
        let weak = weak.clone();
        state.grace_timer = Some(Timeout::new(grace_ms, move || {
            if let Some(strong) = weak.upgrade() {
                let mut state = strong.borrow_mut();
                if !state.disposed {
                    state.machine.end_grace_period();
                    debug!("nav grace period over");
                }
            }
        }));
        info!("nav activated");
        if let Some(transition) = transition {
            Self::play(&state.animator, transition, ViewportClass::current());
        }
    }

    fn request_frame(weak: &Weak<RefCell<NavState>>) {
        let Some(strong) = weak.upgrade() else {
            return;
        };
        let scheduler = {
            let state = strong.borrow();
            if state.disposed {
                return;
            }
            state.scheduler.clone()
        };
        let weak = weak.clone();
        scheduler.schedule(move |_| Self::on_frame(&weak));
    }

    fn on_frame(weak: &Weak<RefCell<NavState>>) {
        let Some(strong) = weak.upgrade() else {
            return;
        };
        let mut state = strong.borrow_mut();
        if state.disposed {
            return;
        }
        let class = ViewportClass::current();
        let observation = ScrollObservation {
            scroll_y: viewport::scroll_y(),
            primary_fraction: state
                .primary
                .cast::<HtmlElement>()
                .map(|el| viewport::element_viewport_fraction(&el))
                .unwrap_or(0.0),
            secondary_visible: state
                .secondary
                .cast::<HtmlElement>()
                .map(|el| viewport::element_viewport_fraction(&el) > 0.0)
                .unwrap_or(false),
            class,
        };
        if let Some(transition) = state.machine.observe(observation) {
            Self::play(&state.animator, transition, class);
        }
    }

    fn play(animator: &ElementAnimator, transition: Transition, class: ViewportClass) {
        debug!("nav {:?}", transition);
        match transition {
            Transition::Show => {
                let duration = match class {
                    ViewportClass::Wide => config::NAV_WIDE_APPEAR_MS,
                    ViewportClass::Narrow => config::NAV_NARROW_APPEAR_MS,
                };
                animator.set_displayed(true);
                animator.animate_to(VisualState::SETTLED, duration, Easing::EaseOutCubic);
            }
            Transition::Hide => {
                let hidden = animator.clone();
                animator.animate_to_then(
                    VisualState::hidden_at(config::NAV_HIDDEN_OFFSET_PX),
                    config::NAV_DISAPPEAR_MS,
                    Easing::EaseInOut,
                    move || hidden.set_displayed(false),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    impl VisibilityStateMachine {
        fn state(&self) -> Visibility {
            self.state
        }

        fn has_activated(&self) -> bool {
            self.has_activated
        }

        fn in_grace_period(&self) -> bool {
            self.in_grace_period
        }

        fn direction(&self) -> ScrollDirection {
            self.direction
        }
    }

    fn narrow_at(scroll_y: f64) -> ScrollObservation {
        ScrollObservation {
            scroll_y,
            primary_fraction: 0.0,
            secondary_visible: false,
            class: ViewportClass::Narrow,
        }
    }

    fn activated() -> VisibilityStateMachine {
        let mut machine = VisibilityStateMachine::new(VisibilityConfig::default(), 0.0);
        assert_eq!(machine.activate(), Some(Transition::Show));
        machine.end_grace_period();
        machine
    }

    #[test]
    fn starts_hidden_and_ignores_scroll_until_activated() {
        let mut machine = VisibilityStateMachine::new(VisibilityConfig::default(), 0.0);
        assert_eq!(machine.state(), Visibility::Hidden);
        for y in [500.0, 200.0, 900.0, 50.0, 3000.0, 0.0] {
            assert_eq!(machine.observe(narrow_at(y)), None);
            let mut wide = narrow_at(y);
            wide.class = ViewportClass::Wide;
            wide.secondary_visible = true;
            assert_eq!(machine.observe(wide), None);
        }
        assert_eq!(machine.state(), Visibility::Hidden);
    }

    #[test]
    fn activation_is_one_shot() {
        let mut machine = VisibilityStateMachine::new(VisibilityConfig::default(), 0.0);
        assert_eq!(machine.activate(), Some(Transition::Show));
        assert_eq!(machine.activate(), None);
        assert!(machine.has_activated());
        assert!(machine.in_grace_period());
    }

    #[test]
    fn narrow_scroll_direction_toggles_visibility() {
        let mut machine = activated();
        assert_eq!(machine.observe(narrow_at(400.0)), Some(Transition::Hide));
        assert_eq!(machine.direction(), ScrollDirection::Down);
        assert_eq!(machine.observe(narrow_at(380.0)), Some(Transition::Show));
        assert_eq!(machine.direction(), ScrollDirection::Up);
        assert_eq!(machine.state(), Visibility::Visible);
    }

    #[test]
    fn small_deltas_are_noise() {
        let mut machine = VisibilityStateMachine::new(VisibilityConfig::default(), 400.0);
        machine.activate();
        machine.end_grace_period();
        assert_eq!(machine.observe(narrow_at(408.0)), None);
        assert_eq!(machine.direction(), ScrollDirection::Idle);
        // Deltas accumulate against the last accepted position.
        assert_eq!(machine.observe(narrow_at(412.0)), Some(Transition::Hide));
    }

    #[test]
    fn no_hide_near_the_top() {
        let mut machine = activated();
        assert_eq!(machine.observe(narrow_at(60.0)), None);
        assert_eq!(machine.state(), Visibility::Visible);
    }

    #[test]
    fn grace_period_suppresses_every_rule() {
        let mut machine = VisibilityStateMachine::new(VisibilityConfig::default(), 0.0);
        machine.activate();
        assert_eq!(machine.observe(narrow_at(900.0)), None);
        assert_eq!(machine.observe(narrow_at(2000.0)), None);
        assert_eq!(machine.state(), Visibility::Visible);
        let mut hero = narrow_at(2000.0);
        hero.primary_fraction = 0.9;
        assert_eq!(machine.observe(hero), None);
        let wide = ScrollObservation { class: ViewportClass::Wide, ..hero };
        assert_eq!(machine.observe(wide), None);
        assert_eq!(machine.state(), Visibility::Visible);
        machine.end_grace_period();
        assert_eq!(machine.observe(narrow_at(2100.0)), Some(Transition::Hide));
    }

    #[test]
    fn narrow_primary_landmark_forces_hidden() {
        let mut machine = activated();
        let mut observation = narrow_at(0.0);
        observation.primary_fraction = 0.5;
        assert_eq!(machine.observe(observation), Some(Transition::Hide));
    }

    #[test]
    fn wide_follows_landmarks() {
        let mut machine = activated();
        let hero = ScrollObservation {
            scroll_y: 0.0,
            primary_fraction: 0.9,
            secondary_visible: false,
            class: ViewportClass::Wide,
        };
        assert_eq!(machine.observe(hero), Some(Transition::Hide));
        assert_eq!(machine.observe(hero), None, "redundant transitions are dropped");

        let between = ScrollObservation { primary_fraction: 0.4, ..hero };
        assert_eq!(machine.observe(between), None);

        let services = ScrollObservation { scroll_y: 1500.0, primary_fraction: 0.0, secondary_visible: true, ..hero };
        assert_eq!(machine.observe(services), Some(Transition::Show));

        // Wide viewports ignore scroll direction.
        let back_up = ScrollObservation { scroll_y: 1200.0, secondary_visible: false, ..services };
        assert_eq!(machine.observe(back_up), None);
        assert_eq!(machine.state(), Visibility::Visible);
    }

    #[test]
    fn already_fired_activation_reaches_the_machine_during_subscribe() {
        let bus = SignalBus::default();
        bus.publish(Signal::PrimaryRevealStarted);

        let machine = Rc::new(RefCell::new(VisibilityStateMachine::new(VisibilityConfig::default(), 0.0)));
        let shown = Rc::new(Cell::new(false));
        let subscription = bus.subscribe(Signal::PrimaryRevealStarted, {
            let machine = machine.clone();
            let shown = shown.clone();
            move |_| {
                let mut machine = machine.borrow_mut();
                shown.set(machine.activate() == Some(Transition::Show));
            }
        });

        assert!(shown.get());
        assert!(machine.borrow().has_activated());
        assert_eq!(machine.borrow().state(), Visibility::Visible);
        drop(subscription);
    }
}
