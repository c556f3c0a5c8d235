use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use web_sys::HtmlElement;
use yew::{Callback, NodeRef};

use super::error::MotionError;
use super::frame::FrameScheduler;
use super::viewport;
use crate::config;

/// How far the user scrolls while a region's progress goes from 0 to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Distance {
    ViewportHeights(f64),
    Pixels(f64),
}

impl Distance {
    pub fn resolve(&self, viewport_height: f64) -> f64 {
        match *self {
            Distance::ViewportHeights(count) => count * viewport_height,
            Distance::Pixels(pixels) => pixels,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Progress starts when the region's top edge reaches this fraction of the
    /// viewport height (0 = top of the screen).
    pub start_fraction: f64,
    pub distance: Distance,
    pub pin: bool,
}

/// Measured geometry of one scroll-driven region, in document pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRegion {
    pub trigger_top: f64,
    pub start_offset: f64,
    pub distance: f64,
    pub pinned: bool,
}

impl ScrollRegion {
    pub fn measure(trigger_top: f64, viewport_height: f64, config: &ProgressConfig) -> Result<Self, MotionError> {
        let distance = config.distance.resolve(viewport_height);
        if !(distance > 0.0) {
            return Err(MotionError::NonPositiveDistance(distance));
        }
        Ok(Self {
            trigger_top,
            start_offset: trigger_top - config.start_fraction * viewport_height,
            distance,
            pinned: config.pin,
        })
    }

    pub fn progress(&self, scroll_y: f64) -> f64 {
        ((scroll_y - self.start_offset) / self.distance).clamp(0.0, 1.0)
    }

    /// Vertical translation that holds a pinned trigger still on screen.
    pub fn pin_offset(&self, scroll_y: f64) -> f64 {
        if !self.pinned {
            return 0.0;
        }
        (scroll_y - self.start_offset).clamp(0.0, self.distance)
    }

}

/// Smoothed scroll speed, used to compress sub-animations during fast scrolls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VelocityTracker {
    last: Option<(f64, f64)>,
    velocity: f64,
}

impl VelocityTracker {
    const SMOOTHING: f64 = 0.6;

    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sample and returns the smoothed velocity in px/ms.
    pub fn sample(&mut self, scroll_y: f64, now_ms: f64) -> f64 {
        if let Some((last_y, last_t)) = self.last {
            let dt = now_ms - last_t;
            if dt > 0.0 {
                let instant = (scroll_y - last_y) / dt;
                self.velocity = Self::SMOOTHING * instant + (1.0 - Self::SMOOTHING) * self.velocity;
            }
        }
        self.last = Some((scroll_y, now_ms));
        self.velocity
    }

    /// 1.0 at normal speeds, rising linearly with speed up to `max`.
    pub fn time_scale(&self, reference_px_per_ms: f64, max: f64) -> f64 {
        (self.velocity.abs() / reference_px_per_ms).clamp(1.0, max.max(1.0))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressSample {
    pub progress: f64,
    pub velocity: f64,
    pub time_scale: f64,
}

struct DriverState {
    target: NodeRef,
    config: ProgressConfig,
    region: Option<ScrollRegion>,
    stale: bool,
    applied_pin: f64,
    velocity: VelocityTracker,
    last: Option<ProgressSample>,
    on_progress: Callback<ProgressSample>,
    scheduler: FrameScheduler,
    listeners: Vec<EventListener>,
    resize_debounce: Option<Timeout>,
    disposed: bool,
}

/// Turns page scroll into progress for one region and reports it once per
/// frame. Measurement happens inside the same frame, before reporting.
#[derive(Clone)]
pub struct ProgressDriver {
    state: Rc<RefCell<DriverState>>,
}

impl PartialEq for ProgressDriver {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl ProgressDriver {
    /// Starts listening right away. If `target` is not mounted yet, measuring
    /// is retried on the next scroll, resize or refresh.
    pub fn attach(target: NodeRef, config: ProgressConfig, on_progress: Callback<ProgressSample>) -> Self {
        let driver = Self {
            state: Rc::new(RefCell::new(DriverState {
                target,
                config,
                region: None,
                stale: true,
                applied_pin: 0.0,
                velocity: VelocityTracker::new(),
                last: None,
                on_progress,
                scheduler: FrameScheduler::new(),
                listeners: Vec::new(),
                resize_debounce: None,
                disposed: false,
            })),
        };

        let weak = Rc::downgrade(&driver.state);
        let mut listeners = Vec::new();
        if let Some(window) = web_sys::window() {
            listeners.push(EventListener::new(&window, "scroll", {
                let weak = weak.clone();
                move |_| Self::request_frame(&weak)
            }));
            for event in ["resize", "orientationchange"] {
                listeners.push(EventListener::new(&window, event, {
                    let weak = weak.clone();
                    move |_| Self::debounce_refresh(&weak)
                }));
            }
            if let Some(document) = window.document() {
                listeners.push(EventListener::new(&document, "visibilitychange", {
                    let weak = weak.clone();
                    move |_| {
                        if let Some(state) = weak.upgrade() {
                            ProgressDriver { state }.refresh();
                        }
                    }
                }));
            }
        }
        driver.state.borrow_mut().listeners = listeners;
        Self::request_frame(&weak);
        driver
    }

    pub fn sample(&self) -> Option<ProgressSample> {
        self.state.borrow().last
    }

    /// Marks geometry stale; the next frame re-measures before reporting.
    pub fn refresh(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.stale = true;
        }
        Self::request_frame(&Rc::downgrade(&self.state));
    }

    /// Releases listeners, timers and the pin. Safe to call more than once.
    pub fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.listeners.clear();
        state.resize_debounce = None;
        state.scheduler.cancel();
        if let Some(element) = state.target.cast::<HtmlElement>() {
            let style = element.style();
            let _ = style.remove_property("transform");
            let _ = style.remove_property("margin-bottom");
        }
        debug!("progress driver disposed");
    }

    fn debounce_refresh(weak: &Weak<RefCell<DriverState>>) {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let weak = weak.clone();
        let timeout = Timeout::new(config::RESIZE_DEBOUNCE_MS, move || {
            if let Some(state) = weak.upgrade() {
                ProgressDriver { state }.refresh();
            }
        });
        let mut state = state.borrow_mut();
        if !state.disposed {
            state.resize_debounce = Some(timeout);
        }
    }

    fn request_frame(weak: &Weak<RefCell<DriverState>>) {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let scheduler = {
            let state = state.borrow();
            if state.disposed {
                return;
            }
            state.scheduler.clone()
        };
        let weak = weak.clone();
        scheduler.schedule(move |timestamp| Self::on_frame(&weak, timestamp));
    }

    fn on_frame(weak: &Weak<RefCell<DriverState>>, timestamp: f64) {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let (sample, on_progress) = {
            let mut state = state.borrow_mut();
            if state.disposed {
                return;
            }
            let Some(element) = state.target.cast::<HtmlElement>() else {
                // Not mounted yet; the next scroll, resize or refresh tries again.
                return;
            };
            let scroll_y = viewport::scroll_y();
            if state.stale || state.region.is_none() {
                let (_, viewport_height) = viewport::viewport_size();
                let top = viewport::document_top(&element) - state.applied_pin;
                match ScrollRegion::measure(top, viewport_height, &state.config) {
                    Ok(region) => {
                        if region.pinned {
                            let _ = element
                                .style()
                                .set_property("margin-bottom", &format!("{:.0}px", region.distance));
                        }
                        info!("measured scroll region {:?}", region);
                        state.region = Some(region);
                        state.stale = false;
                        state.velocity.reset();
                    }
                    Err(err) => {
                        debug!("skipping measurement: {}", err);
                        return;
                    }
                }
            }
            let Some(region) = state.region else {
                return;
            };
            if region.pinned {
                let pin = region.pin_offset(scroll_y);
                if pin != state.applied_pin {
                    let _ = element
                        .style()
                        .set_property("transform", &format!("translate3d(0, {:.2}px, 0)", pin));
                    state.applied_pin = pin;
                }
            }
            let velocity = state.velocity.sample(scroll_y, timestamp);
            let sample = ProgressSample {
                progress: region.progress(scroll_y),
                velocity,
                time_scale: state
                    .velocity
                    .time_scale(config::TIME_SCALE_REFERENCE_PX_PER_MS, config::MAX_TIME_SCALE),
            };
            state.last = Some(sample);
            (sample, state.on_progress.clone())
        };
        on_progress.emit(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned(start_fraction: f64, viewports: f64) -> ProgressConfig {
        ProgressConfig {
            start_fraction,
            distance: Distance::ViewportHeights(viewports),
            pin: true,
        }
    }

    #[test]
    fn progress_is_clamped_and_normalized() {
        let region = ScrollRegion::measure(1000.0, 800.0, &pinned(0.0, 2.0)).unwrap();
        assert_eq!(region.start_offset, 1000.0);
        assert_eq!(region.distance, 1600.0);
        assert_eq!(region.progress(0.0), 0.0);
        assert_eq!(region.progress(1000.0), 0.0);
        assert_eq!(region.progress(1800.0), 0.5);
        assert_eq!(region.progress(2600.0), 1.0);
        assert_eq!(region.progress(9000.0), 1.0);
    }

    #[test]
    fn progress_follows_scroll_back_and_forth() {
        let region = ScrollRegion::measure(0.0, 1000.0, &pinned(0.0, 1.0)).unwrap();
        let forward = region.progress(700.0);
        let back = region.progress(300.0);
        assert!(back < forward);
        let positions = [0.0, 100.0, 250.0, 250.0, 600.0, 1200.0];
        let values: Vec<f64> = positions.iter().map(|y| region.progress(*y)).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn start_fraction_moves_the_trigger_line() {
        let config = ProgressConfig {
            start_fraction: 0.5,
            distance: Distance::Pixels(400.0),
            pin: false,
        };
        let region = ScrollRegion::measure(2000.0, 800.0, &config).unwrap();
        assert_eq!(region.start_offset, 1600.0);
        assert_eq!(region.progress(1800.0), 0.5);
        assert_eq!(region.pin_offset(1800.0), 0.0);
    }

    #[test]
    fn pin_offset_holds_the_trigger_in_place() {
        let region = ScrollRegion::measure(500.0, 1000.0, &pinned(0.0, 1.0)).unwrap();
        assert_eq!(region.pin_offset(200.0), 0.0);
        assert_eq!(region.pin_offset(900.0), 400.0);
        assert_eq!(region.pin_offset(5000.0), 1000.0);
    }

    #[test]
    fn zero_distance_is_rejected() {
        let err = ScrollRegion::measure(0.0, 0.0, &pinned(0.0, 3.0)).unwrap_err();
        assert_eq!(err, MotionError::NonPositiveDistance(0.0));
    }

    #[test]
    fn time_scale_is_bounded() {
        let mut tracker = VelocityTracker::new();
        tracker.sample(0.0, 0.0);
        tracker.sample(10.0, 16.0);
        assert_eq!(tracker.time_scale(1.5, 3.0), 1.0);

        let mut fast = VelocityTracker::new();
        let mut velocity = fast.sample(0.0, 0.0);
        for frame in 1..20 {
            velocity = fast.sample(frame as f64 * 400.0, frame as f64 * 16.0);
        }
        assert!(velocity > 20.0);
        assert_eq!(fast.time_scale(1.5, 3.0), 3.0);

        let mut upward = VelocityTracker::new();
        upward.sample(10_000.0, 0.0);
        assert!(upward.sample(9_950.0, 16.0) < 0.0);
        assert!(upward.time_scale(1.5, 3.0) > 1.0);
    }
}
