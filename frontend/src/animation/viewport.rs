use std::rc::Rc;

use serde::{Deserialize, Serialize};
use web_sys::{Element, Event, ScrollBehavior, ScrollToOptions};
use yew::prelude::*;
use yew_hooks::prelude::*;

use super::frame::FrameScheduler;
use crate::config;

/// Responsive class of the current viewport. Distances and rule sets are
/// chosen per class, and crossing the breakpoint rebuilds whatever depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewportClass {
    Narrow,
    Wide,
}

impl ViewportClass {
    pub fn from_width(width: f64) -> Self {
        if width < config::NARROW_BREAKPOINT_PX {
            ViewportClass::Narrow
        } else {
            ViewportClass::Wide
        }
    }

    pub fn current() -> Self {
        Self::from_width(viewport_size().0)
    }
}

/// Inner (width, height) of the window, or (0, 0) before the window exists.
pub fn viewport_size() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (0.0, 0.0);
    };
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width, height)
}

pub fn scroll_y() -> f64 {
    web_sys::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0)
}

/// Milliseconds on the same clock `requestAnimationFrame` timestamps use.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Share of the viewport height covered by a box spanning `[top, bottom)` in
/// viewport coordinates.
pub fn visible_fraction(top: f64, bottom: f64, viewport_height: f64) -> f64 {
    if viewport_height <= 0.0 {
        return 0.0;
    }
    let visible = bottom.min(viewport_height) - top.max(0.0);
    (visible / viewport_height).clamp(0.0, 1.0)
}

/// Share of an element's own height that is on screen.
pub fn own_visible_fraction(top: f64, bottom: f64, viewport_height: f64) -> f64 {
    let height = bottom - top;
    if height <= 0.0 {
        return 0.0;
    }
    let visible = bottom.min(viewport_height) - top.max(0.0);
    (visible / height).clamp(0.0, 1.0)
}

pub fn element_viewport_fraction(element: &Element) -> f64 {
    let rect = element.get_bounding_client_rect();
    visible_fraction(rect.top(), rect.bottom(), viewport_size().1)
}

pub fn element_own_fraction(element: &Element) -> f64 {
    let rect = element.get_bounding_client_rect();
    own_visible_fraction(rect.top(), rect.bottom(), viewport_size().1)
}

/// Top edge of `element` in document coordinates.
pub fn document_top(element: &Element) -> f64 {
    element.get_bounding_client_rect().top() + scroll_y()
}

pub fn scroll_to_top() {
    if let Some(window) = web_sys::window() {
        window.scroll_to_with_x_and_y(0.0, 0.0);
    }
}

/// Programmatic smooth scroll used by the "scroll down" affordance.
pub fn scroll_down_by(pixels: f64) {
    if let Some(window) = web_sys::window() {
        let options = ScrollToOptions::new();
        options.set_top(pixels);
        options.set_behavior(ScrollBehavior::Smooth);
        window.scroll_by_with_scroll_to_options(&options);
    }
}

/// One-shot entry detection: reports the first observation at or above the
/// threshold and nothing after it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnterOnce {
    threshold: f64,
    entered: bool,
}

impl EnterOnce {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            entered: false,
        }
    }

    pub fn has_entered(&self) -> bool {
        self.entered
    }

    /// True exactly once, for the first `fraction` that reaches the threshold.
    pub fn observe(&mut self, fraction: f64) -> bool {
        if self.entered || fraction < self.threshold {
            return false;
        }
        self.entered = true;
        true
    }
}

/// Current viewport class; callers that key effects on it only rebuild when
/// the breakpoint is crossed.
#[hook]
pub fn use_viewport_class() -> ViewportClass {
    let (width, _) = use_window_size();
    ViewportClass::from_width(width)
}

/// Emits `on_enter` once, the first time at least `threshold` of the target's
/// height is on screen. The guard lives in the component instance, so a
/// remounted component animates again.
#[hook]
pub fn use_enter_viewport(target: NodeRef, threshold: f64, on_enter: Callback<()>) {
    let entry = use_mut_ref(|| EnterOnce::new(threshold));
    let scheduler = use_memo(|_| FrameScheduler::new(), ());

    let check: Rc<dyn Fn()> = {
        let entry = entry.clone();
        let scheduler = scheduler.clone();
        Rc::new(move || {
            if entry.borrow().has_entered() {
                return;
            }
            let target = target.clone();
            let entry = entry.clone();
            let on_enter = on_enter.clone();
            scheduler.schedule(move |_| {
                let Some(element) = target.cast::<Element>() else {
                    return;
                };
                if entry.borrow_mut().observe(element_own_fraction(&element)) {
                    on_enter.emit(());
                }
            });
        })
    };

    {
        let check = check.clone();
        use_event_with_window("scroll", move |_: Event| check());
    }

    use_effect_with_deps(
        move |_| {
            check();
            move || scheduler.cancel()
        },
        (),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_splits_classes() {
        assert_eq!(ViewportClass::from_width(375.0), ViewportClass::Narrow);
        assert_eq!(ViewportClass::from_width(767.9), ViewportClass::Narrow);
        assert_eq!(ViewportClass::from_width(768.0), ViewportClass::Wide);
        assert_eq!(ViewportClass::from_width(1440.0), ViewportClass::Wide);
    }

    #[test]
    fn visible_fraction_clips_to_viewport() {
        assert_eq!(visible_fraction(0.0, 800.0, 800.0), 1.0);
        assert_eq!(visible_fraction(-400.0, 400.0, 800.0), 0.5);
        assert_eq!(visible_fraction(900.0, 1500.0, 800.0), 0.0);
        assert_eq!(visible_fraction(-2000.0, 2000.0, 800.0), 1.0);
        assert_eq!(visible_fraction(0.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn own_fraction_is_relative_to_element_height() {
        assert_eq!(own_visible_fraction(700.0, 900.0, 800.0), 0.5);
        assert_eq!(own_visible_fraction(-2000.0, 2000.0, 800.0), 0.2);
        assert_eq!(own_visible_fraction(10.0, 10.0, 800.0), 0.0);
    }

    #[test]
    fn enter_fires_once_at_threshold() {
        let mut entry = EnterOnce::new(0.3);
        assert!(!entry.observe(0.1));
        assert!(!entry.observe(0.29));
        assert!(entry.observe(0.3));
        assert!(entry.has_entered());
        assert!(!entry.observe(0.9));
        assert!(!entry.observe(1.0));
    }

    #[test]
    fn scroll_burst_before_entry_reports_nothing() {
        let mut entry = EnterOnce::new(0.5);
        let fired = (0..120).map(|i| i as f64 / 1000.0).filter(|f| entry.observe(*f)).count();
        assert_eq!(fired, 0);
        assert!(!entry.has_entered());
    }
}
