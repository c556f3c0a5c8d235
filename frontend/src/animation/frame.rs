use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_render::{request_animation_frame, AnimationFrame};

/// The in-flight flag behind per-frame coalescing: the first request claims the
/// gate, every later request is dropped until the frame runs and releases it.
#[derive(Debug, Default)]
pub struct FrameGate {
    in_flight: Cell<bool>,
}

impl FrameGate {
    /// True if the caller should schedule work.
    pub fn try_claim(&self) -> bool {
        !self.in_flight.replace(true)
    }

    pub fn release(&self) {
        self.in_flight.set(false);
    }
}

/// Runs at most one unit of work per rendered frame, however often it is asked.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    gate: Rc<FrameGate>,
    pending: Rc<RefCell<Option<AnimationFrame>>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `work` for the next frame unless a frame is already queued, in
    /// which case `work` is dropped.
    pub fn schedule(&self, work: impl FnOnce(f64) + 'static) {
        if !self.gate.try_claim() {
            return;
        }
        let gate = self.gate.clone();
        let frame = request_animation_frame(move |timestamp| {
            gate.release();
            work(timestamp);
        });
        *self.pending.borrow_mut() = Some(frame);
    }

    /// Drops the queued frame, which cancels it.
    pub fn cancel(&self) {
        self.pending.borrow_mut().take();
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_admits_one_claim_until_released() {
        let gate = FrameGate::default();
        assert!(gate.try_claim());
        assert!(!gate.try_claim());
        assert!(!gate.try_claim());
        gate.release();
        assert!(gate.try_claim());
    }

    #[test]
    fn burst_of_requests_yields_single_unit_of_work() {
        let gate = FrameGate::default();
        let scheduled = (0..120).filter(|_| gate.try_claim()).count();
        assert_eq!(scheduled, 1);
    }

    #[test]
    fn each_frame_admits_one_unit_of_work() {
        let gate = FrameGate::default();
        let mut ran = 0;
        for _frame in 0..3 {
            ran += (0..40).filter(|_| gate.try_claim()).count();
            gate.release();
        }
        assert_eq!(ran, 3);
    }
}
