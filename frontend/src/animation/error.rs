use thiserror::Error;

/// Rejected timeline configuration. Scheduling problems at runtime are never
/// reported through this type; they are absorbed where they happen.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error("phase {index} window [{start}, {end}] is inverted or outside [0, 1]")]
    InvalidPhaseWindow { index: usize, start: f64, end: f64 },
    #[error("phase {index} starts before the previous phase ends")]
    OverlappingPhases { index: usize },
    #[error("transition width {width} does not fit inside phase {index}")]
    TransitionTooWide { index: usize, width: f64 },
    #[error("a {0} needs at least one entry")]
    Empty(&'static str),
    #[error("scroll distance must be positive, got {0}")]
    NonPositiveDistance(f64),
}
