use log::Level;

#[cfg(debug_assertions)]
pub fn get_booking_webhook_url() -> &'static str {
    "http://localhost:3001/webhook/booking"  // Local webhook catcher
}

#[cfg(not(debug_assertions))]
pub fn get_booking_webhook_url() -> &'static str {
    "/webhook/booking"  // Production URL
}

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

// Everything below was tuned by eye against the live page. Treat the values as
// knobs, not as derived quantities.

/// Viewports narrower than this use the narrow rule sets and distances.
pub const NARROW_BREAKPOINT_PX: f64 = 768.0;

/// Debounce applied to resize/orientation notifications before re-measuring.
pub const RESIZE_DEBOUNCE_MS: u32 = 150;

// Scramble text
pub const SCRAMBLE_DURATION_MS: u32 = 800;
pub const SCRAMBLE_RATIO: f64 = 0.3;
pub const SCRAMBLE_TICK_MS: u32 = 50;
pub const SCRAMBLE_MIN_REVEAL_INTERVAL_MS: u32 = 20;
pub const SCRAMBLE_GLYPHS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789#%&*+=?";

/// Fraction of a title that must be on screen before its scramble starts.
pub const TITLE_ENTER_FRACTION: f64 = 0.2;

// Progress driver
/// Scroll speed (px/ms) at which sub-animations start running faster than real time.
pub const TIME_SCALE_REFERENCE_PX_PER_MS: f64 = 1.5;
pub const MAX_TIME_SCALE: f64 = 3.0;

// Hero pinned sequence
pub const HERO_PHASE_COUNT: usize = 4;
pub const HERO_PHASES_START: f64 = 0.2;
pub const HERO_PHASES_END: f64 = 1.0;
pub const HERO_TRANSITION_WIDTH: f64 = 0.08;
pub const HERO_SETTLE_DISTANCE_PX: f64 = 40.0;
pub const HERO_PIN_VIEWPORTS: f64 = 3.0;

/// Pixels advanced by the "scroll down" affordance.
pub const SCROLL_DOWN_STEP_PX: f64 = 600.0;

// Card stack
pub const STACK_OVERLAP: f64 = 0.25;
pub const STACK_WIDE_SCALE_STEP: f64 = 0.05;
pub const STACK_NARROW_SCALE_STEP: f64 = 0.04;
pub const STACK_WIDE_OFFSET_STEP_PX: f64 = 28.0;
pub const STACK_NARROW_OFFSET_STEP_PX: f64 = 16.0;
pub const STACK_WIDE_EXIT_VIEWPORTS: f64 = 1.2;
pub const STACK_NARROW_EXIT_VIEWPORTS: f64 = 1.0;
pub const STACK_EXIT_SCALE: f64 = 0.9;
pub const STACK_START_FRACTION: f64 = 0.0;

// Navbar visibility
pub const NAV_NOISE_THRESHOLD_PX: f64 = 10.0;
pub const NAV_MIN_HIDE_OFFSET_PX: f64 = 100.0;
pub const NAV_WIDE_PRIMARY_FRACTION: f64 = 0.7;
pub const NAV_NARROW_PRIMARY_FRACTION: f64 = 0.3;
pub const NAV_GRACE_PERIOD_MS: u32 = 1500;
pub const NAV_WIDE_APPEAR_MS: f64 = 600.0;
pub const NAV_NARROW_APPEAR_MS: f64 = 400.0;
pub const NAV_DISAPPEAR_MS: f64 = 300.0;
pub const NAV_HIDDEN_OFFSET_PX: f64 = -24.0;

// Pointer parallax
pub const PARALLAX_MAX_SHIFT_PX: f64 = 24.0;

// Booking section
pub const BOOKING_APPEAR_MS: f64 = 700.0;
pub const BOOKING_RISE_PX: f64 = 32.0;
