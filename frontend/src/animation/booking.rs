use web_sys::Element;

use super::scramble::{ScrambleHandle, ScrambleOptions, ScrambleTextEngine};
use super::tween::{Easing, ElementAnimator, VisualState};
use crate::config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingOutcome {
    Success,
    Failure,
}

impl BookingOutcome {
    pub fn from_sent(sent: bool) -> Self {
        if sent {
            BookingOutcome::Success
        } else {
            BookingOutcome::Failure
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BookingOutcome::Success => "Reserva confirmada",
            BookingOutcome::Failure => "No se pudo enviar",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            BookingOutcome::Success => "Te escribiremos en menos de 24 horas para confirmar la cita.",
            BookingOutcome::Failure => "Algo salió mal. Inténtalo de nuevo en unos minutos o escríbenos directamente.",
        }
    }
}

/// Where the booking panel rests before it appears.
pub fn resting_state() -> VisualState {
    VisualState::hidden_at(config::BOOKING_RISE_PX)
}

/// First appearance of the booking form.
pub fn initial_appear(panel: &ElementAnimator) {
    panel.set(resting_state());
    panel.animate_to(VisualState::SETTLED, config::BOOKING_APPEAR_MS, Easing::EaseOutCubic);
}

/// Swaps the form for its result: the panel rises back in and its title
/// scrambles into the outcome's headline.
pub fn result_appear(
    panel: &ElementAnimator,
    title_engine: &ScrambleTextEngine,
    title: Option<Element>,
    outcome: BookingOutcome,
) -> ScrambleHandle {
    panel.set(resting_state());
    panel.animate_to(VisualState::SETTLED, config::BOOKING_APPEAR_MS, Easing::EaseOutCubic);
    title_engine.run(title, outcome.title(), &ScrambleOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_follows_send_result() {
        assert_eq!(BookingOutcome::from_sent(true), BookingOutcome::Success);
        assert_eq!(BookingOutcome::from_sent(false), BookingOutcome::Failure);
        assert_ne!(BookingOutcome::Success.title(), BookingOutcome::Failure.title());
    }

    #[test]
    fn panel_rests_below_and_transparent() {
        let resting = resting_state();
        assert_eq!(resting.opacity, 0.0);
        assert!(resting.translate_y > 0.0);
    }
}
