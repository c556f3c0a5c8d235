use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_render::{request_animation_frame, AnimationFrame};
use serde::{Deserialize, Serialize};
use web_sys::HtmlElement;

use super::viewport;

/// The property set every animator in the engine writes: opacity plus a
/// translate/scale transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub opacity: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl VisualState {
    pub const SETTLED: VisualState = VisualState {
        opacity: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub fn hidden_at(translate_y: f64) -> Self {
        Self { opacity: 0.0, translate_y, ..Self::SETTLED }
    }

    pub fn lerp(&self, to: &VisualState, t: f64) -> VisualState {
        VisualState {
            opacity: lerp(self.opacity, to.opacity, t),
            translate_x: lerp(self.translate_x, to.translate_x, t),
            translate_y: lerp(self.translate_y, to.translate_y, t),
            scale: lerp(self.scale, to.scale, t),
        }
    }

    pub fn transform(&self) -> String {
        format!(
            "translate3d({:.2}px, {:.2}px, 0) scale({:.4})",
            self.translate_x, self.translate_y, self.scale
        )
    }

    /// Writes the state to the element's inline style.
    pub fn apply(&self, element: &HtmlElement) {
        let style = element.style();
        let _ = style.set_property("opacity", &format!("{:.4}", self.opacity));
        let _ = style.set_property("transform", &self.transform());
    }
}

impl Default for VisualState {
    fn default() -> Self {
        Self::SETTLED
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseOutCubic,
    EaseInOut,
    Smoothstep,
}

impl Easing {
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: VisualState,
    pub to: VisualState,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: VisualState, to: VisualState, start_ms: f64, duration_ms: f64, easing: Easing) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: duration_ms.max(1.0),
            easing,
        }
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_done(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    pub fn sample(&self, now_ms: f64) -> VisualState {
        self.from.lerp(&self.to, self.easing.apply(self.progress(now_ms)))
    }

    /// Restarts toward `to` from wherever the tween currently is, so an
    /// interrupted animation never jumps.
    pub fn retarget(&mut self, now_ms: f64, to: VisualState, duration_ms: f64, easing: Easing) {
        let current = self.sample(now_ms);
        *self = Tween::new(current, to, now_ms, duration_ms, easing);
    }

    /// The tween to run after a new request: `running` is retargeted if there
    /// is one, otherwise a fresh tween starts from `resting`.
    pub fn follow(
        running: Option<Tween>,
        resting: VisualState,
        now_ms: f64,
        to: VisualState,
        duration_ms: f64,
        easing: Easing,
    ) -> Tween {
        match running {
            Some(mut tween) => {
                tween.retarget(now_ms, to, duration_ms, easing);
                tween
            }
            None => Tween::new(resting, to, now_ms, duration_ms, easing),
        }
    }
}

struct AnimatorState {
    element: HtmlElement,
    current: VisualState,
    tween: Option<Tween>,
    on_complete: Option<Box<dyn FnOnce()>>,
    frame: Option<AnimationFrame>,
    alive: bool,
}

/// Owns the animated style of one element. A new animation always cancels the
/// previous one (and its completion callback) before it starts.
#[derive(Clone)]
pub struct ElementAnimator {
    state: Rc<RefCell<AnimatorState>>,
}

impl PartialEq for ElementAnimator {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl ElementAnimator {
    pub fn new(element: HtmlElement, initial: VisualState) -> Self {
        initial.apply(&element);
        Self {
            state: Rc::new(RefCell::new(AnimatorState {
                element,
                current: initial,
                tween: None,
                on_complete: None,
                frame: None,
                alive: true,
            })),
        }
    }

    /// Jumps to `state`, dropping any running tween.
    pub fn set(&self, state: VisualState) {
        let mut inner = self.state.borrow_mut();
        if !inner.alive {
            return;
        }
        inner.tween = None;
        inner.on_complete = None;
        inner.frame = None;
        inner.current = state;
        state.apply(&inner.element);
    }

    pub fn set_displayed(&self, displayed: bool) {
        let inner = self.state.borrow();
        if !inner.alive {
            return;
        }
        let style = inner.element.style();
        if displayed {
            let _ = style.remove_property("display");
        } else {
            let _ = style.set_property("display", "none");
        }
    }

    pub fn animate_to(&self, to: VisualState, duration_ms: f64, easing: Easing) {
        self.animate_to_then(to, duration_ms, easing, || ());
    }

    pub fn animate_to_then(
        &self,
        to: VisualState,
        duration_ms: f64,
        easing: Easing,
        on_complete: impl FnOnce() + 'static,
    ) {
        {
            let mut inner = self.state.borrow_mut();
            if !inner.alive {
                return;
            }
            let tween = Tween::follow(inner.tween, inner.current, viewport::now_ms(), to, duration_ms, easing);
            inner.frame = None;
            inner.tween = Some(tween);
            inner.on_complete = Some(Box::new(on_complete));
        }
        Self::schedule(Rc::downgrade(&self.state));
    }

    fn schedule(state: Weak<RefCell<AnimatorState>>) {
        let Some(strong) = state.upgrade() else {
            return;
        };
        let frame = request_animation_frame(move |timestamp| Self::step(state, timestamp));
        strong.borrow_mut().frame = Some(frame);
    }

    fn step(state: Weak<RefCell<AnimatorState>>, timestamp: f64) {
        let Some(strong) = state.upgrade() else {
            return;
        };
        let finished = {
            let mut inner = strong.borrow_mut();
            if !inner.alive {
                return;
            }
            let Some(tween) = inner.tween else {
                return;
            };
            let sampled = tween.sample(timestamp);
            inner.current = sampled;
            sampled.apply(&inner.element);
            if tween.is_done(timestamp) {
                inner.tween = None;
                inner.on_complete.take()
            } else {
                None
            }
        };
        match finished {
            Some(on_complete) => on_complete(),
            None => {
                if strong.borrow().tween.is_some() {
                    Self::schedule(state);
                }
            }
        }
    }

    /// Stops all pending work. Idempotent.
    pub fn dispose(&self) {
        let mut inner = self.state.borrow_mut();
        inner.alive = false;
        inner.tween = None;
        inner.on_complete = None;
        inner.frame = None;
    }
}
