use std::cell::Cell;
use std::rc::Rc;

use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlElement, MouseEvent};
use yew::NodeRef;

use super::frame::FrameScheduler;
use super::viewport;
use crate::config;

/// Offset for a layer at `depth` (0 = static, 1 = full shift) given the pointer
/// position. Layers move against the pointer, deeper layers further.
pub fn pointer_offset(pointer: (f64, f64), viewport: (f64, f64), depth: f64, max_shift: f64) -> (f64, f64) {
    let (width, height) = viewport;
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let nx = ((pointer.0 / width) - 0.5).clamp(-0.5, 0.5) * 2.0;
    let ny = ((pointer.1 / height) - 0.5).clamp(-0.5, 0.5) * 2.0;
    (-nx * depth * max_shift, -ny * depth * max_shift)
}

/// Moves a set of layers with the mouse, at most once per frame. Dropping it
/// removes the listener and cancels any queued frame.
pub struct PointerParallax {
    _listener: EventListener,
    scheduler: FrameScheduler,
}

impl PointerParallax {
    pub fn attach(layers: Vec<(NodeRef, f64)>) -> Option<Self> {
        let window = web_sys::window()?;
        let scheduler = FrameScheduler::new();
        let latest = Rc::new(Cell::new((0.0, 0.0)));
        let layers = Rc::new(layers);
        let listener = {
            let scheduler = scheduler.clone();
            EventListener::new(&window, "mousemove", move |event: &Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                latest.set((event.client_x() as f64, event.client_y() as f64));
                let latest = latest.clone();
                let layers = layers.clone();
                scheduler.schedule(move |_| {
                    let pointer = latest.get();
                    let size = viewport::viewport_size();
                    for (node, depth) in layers.iter() {
                        if let Some(element) = node.cast::<HtmlElement>() {
                            let (x, y) = pointer_offset(pointer, size, *depth, config::PARALLAX_MAX_SHIFT_PX);
                            let _ = element
                                .style()
                                .set_property("transform", &format!("translate3d({:.2}px, {:.2}px, 0)", x, y));
                        }
                    }
                });
            })
        };
        Some(Self {
            _listener: listener,
            scheduler,
        })
    }
}

impl Drop for PointerParallax {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_pointer_means_no_offset() {
        assert_eq!(pointer_offset((500.0, 400.0), (1000.0, 800.0), 1.0, 20.0), (0.0, 0.0));
    }

    #[test]
    fn offsets_oppose_the_pointer_and_scale_with_depth() {
        let (x, y) = pointer_offset((1000.0, 0.0), (1000.0, 800.0), 0.5, 20.0);
        assert_eq!((x, y), (-10.0, 10.0));
        let (deep_x, _) = pointer_offset((1000.0, 0.0), (1000.0, 800.0), 1.0, 20.0);
        assert!(deep_x.abs() > x.abs());
    }

    #[test]
    fn degenerate_viewport_is_ignored() {
        assert_eq!(pointer_offset((10.0, 10.0), (0.0, 0.0), 1.0, 20.0), (0.0, 0.0));
    }
}
