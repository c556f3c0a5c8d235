use yew::NodeRef;

use super::signals::SignalBus;

/// What the page shares with the persistent chrome around it: the signal bus
/// and the two landmarks the navbar watches.
#[derive(Clone, Default, PartialEq)]
pub struct MotionContext {
    pub bus: SignalBus,
    /// The hero; the navbar stays out of its way.
    pub primary: NodeRef,
    /// The services section; the navbar appears once it is on screen.
    pub secondary: NodeRef,
}
