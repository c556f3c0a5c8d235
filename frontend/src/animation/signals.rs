//! One-shot page signals shared between sections.
//!
//! Each [`Signal`] fires at most once per bus. A listener that subscribes after
//! its signal already fired is called immediately, so a consumer can never miss
//! an activation that happened before it mounted.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The card stack's pinned region was entered for the first time.
    PrimaryRevealStarted,
    /// The hero's pinned sequence reached its end.
    PrimaryLandmarkResolved,
}

type Listener = Rc<dyn Fn(Signal)>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    listeners: Vec<(u64, Signal, Listener)>,
    fired: HashSet<Signal>,
}

#[derive(Clone, Default)]
pub struct SignalBus {
    state: Rc<RefCell<BusState>>,
}

impl PartialEq for SignalBus {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl SignalBus {
    pub fn has_fired(&self, signal: Signal) -> bool {
        self.state.borrow().fired.contains(&signal)
    }

    /// Fires `signal`. Returns false (and notifies nobody) if it already fired.
    pub fn publish(&self, signal: Signal) -> bool {
        let listeners: Vec<Listener> = {
            let mut state = self.state.borrow_mut();
            if !state.fired.insert(signal) {
                return false;
            }
            let (matching, rest): (Vec<_>, Vec<_>) = state
                .listeners
                .drain(..)
                .partition(|(_, wanted, _)| *wanted == signal);
            state.listeners = rest;
            matching.into_iter().map(|(_, _, listener)| listener).collect()
        };
        debug!("signal {:?} delivered to {} listener(s)", signal, listeners.len());
        for listener in listeners {
            listener(signal);
        }
        true
    }

    pub fn subscribe(&self, signal: Signal, listener: impl Fn(Signal) + 'static) -> Subscription {
        if self.has_fired(signal) {
            listener(signal);
            return Subscription { state: Weak::new(), id: 0 };
        }
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.listeners.push((id, signal, Rc::new(listener)));
        Subscription {
            state: Rc::downgrade(&self.state),
            id,
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
pub struct Subscription {
    state: Weak<RefCell<BusState>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            if let Ok(mut state) = state.try_borrow_mut() {
                state.listeners.retain(|(id, _, _)| *id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn publish_is_one_shot() {
        let bus = SignalBus::default();
        let hits = Rc::new(Cell::new(0));
        let _sub = {
            let hits = hits.clone();
            bus.subscribe(Signal::PrimaryRevealStarted, move |_| hits.set(hits.get() + 1))
        };
        assert!(bus.publish(Signal::PrimaryRevealStarted));
        assert!(!bus.publish(Signal::PrimaryRevealStarted));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listeners_only_hear_their_signal() {
        let bus = SignalBus::default();
        let heard = Rc::new(RefCell::new(Vec::new()));
        let _a = {
            let heard = heard.clone();
            bus.subscribe(Signal::PrimaryLandmarkResolved, move |s| heard.borrow_mut().push(s))
        };
        bus.publish(Signal::PrimaryRevealStarted);
        assert!(heard.borrow().is_empty());
        bus.publish(Signal::PrimaryLandmarkResolved);
        assert_eq!(*heard.borrow(), vec![Signal::PrimaryLandmarkResolved]);
    }

    #[test]
    fn late_subscriber_is_called_immediately() {
        let bus = SignalBus::default();
        bus.publish(Signal::PrimaryRevealStarted);
        let hit = Rc::new(Cell::new(false));
        let _sub = {
            let hit = hit.clone();
            bus.subscribe(Signal::PrimaryRevealStarted, move |_| hit.set(true))
        };
        assert!(hit.get());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn dropped_subscription_is_not_called() {
        let bus = SignalBus::default();
        let hit = Rc::new(Cell::new(false));
        let sub = {
            let hit = hit.clone();
            bus.subscribe(Signal::PrimaryRevealStarted, move |_| hit.set(true))
        };
        assert_eq!(bus.listener_count(), 1);
        drop(sub);
        assert_eq!(bus.listener_count(), 0);
        bus.publish(Signal::PrimaryRevealStarted);
        assert!(!hit.get());
    }

    #[test]
    fn listener_may_publish_reentrantly() {
        let bus = SignalBus::default();
        let resolved = Rc::new(Cell::new(false));
        let _chain = {
            let bus = bus.clone();
            bus.clone().subscribe(Signal::PrimaryRevealStarted, move |_| {
                bus.publish(Signal::PrimaryLandmarkResolved);
            })
        };
        let _end = {
            let resolved = resolved.clone();
            bus.subscribe(Signal::PrimaryLandmarkResolved, move |_| resolved.set(true))
        };
        bus.publish(Signal::PrimaryRevealStarted);
        assert!(resolved.get());
    }
}
