//! Maps one progress value onto N content phases that fade and slide through
//! each other.
//!
//! Every phase owns a window of progress. It ramps in across its start
//! boundary and out across its end boundary; the ramps are `transition_width`
//! wide and centered on the boundary, so neighbours cross-fade. The first phase
//! ramps in entirely inside its own window (nothing is visible before it), and
//! the last phase has no exit ramp: once it is in, it stays.

use serde::{Deserialize, Serialize};

use super::error::MotionError;

const EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub index: usize,
    pub start_progress: f64,
    pub end_progress: f64,
    pub transition_width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseState {
    pub phase_index: usize,
    pub opacity: f64,
    /// Vertical offset in pixels: positive is below the resting spot (not yet
    /// entered), negative above it (already left).
    pub offset: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhaseTimeline {
    phases: Vec<Phase>,
    settle_distance: f64,
}

fn ramp(progress: f64, from: f64, to: f64) -> f64 {
    if to - from <= EPSILON {
        return if progress >= to { 1.0 } else { 0.0 };
    }
    ((progress - from) / (to - from)).clamp(0.0, 1.0)
}

impl PhaseTimeline {
    pub fn new(windows: &[(f64, f64)], transition_width: f64, settle_distance: f64) -> Result<Self, MotionError> {
        if windows.is_empty() {
            return Err(MotionError::Empty("phase timeline"));
        }
        let last = windows.len() - 1;
        let mut phases = Vec::with_capacity(windows.len());
        for (index, &(start, end)) in windows.iter().enumerate() {
            if !(0.0..=1.0 + EPSILON).contains(&start) || !(0.0..=1.0 + EPSILON).contains(&end) || end <= start {
                return Err(MotionError::InvalidPhaseWindow { index, start, end });
            }
            if index > 0 && start < windows[index - 1].1 - EPSILON {
                return Err(MotionError::OverlappingPhases { index });
            }
            // Room each phase needs for its own ramps.
            let needed = match (index == 0, index == last) {
                (true, true) => transition_width,
                (true, false) => 1.5 * transition_width,
                (false, true) => 0.5 * transition_width,
                (false, false) => transition_width,
            };
            if transition_width < 0.0 || needed > end - start + EPSILON {
                return Err(MotionError::TransitionTooWide { index, width: transition_width });
            }
            phases.push(Phase {
                index,
                start_progress: start,
                end_progress: end,
                transition_width,
            });
        }
        Ok(Self { phases, settle_distance })
    }

    /// `count` equal windows laid end to end across `[start, end]`.
    pub fn contiguous(
        start: f64,
        end: f64,
        count: usize,
        transition_width: f64,
        settle_distance: f64,
    ) -> Result<Self, MotionError> {
        if count == 0 {
            return Err(MotionError::Empty("phase timeline"));
        }
        let span = (end - start) / count as f64;
        let windows: Vec<(f64, f64)> = (0..count)
            .map(|i| {
                let window_end = if i + 1 == count { end } else { start + span * (i + 1) as f64 };
                (start + span * i as f64, window_end)
            })
            .collect();
        Self::new(&windows, transition_width, settle_distance)
    }

    fn entry_ramp(phase: &Phase) -> (f64, f64) {
        if phase.index == 0 {
            (phase.start_progress, phase.start_progress + phase.transition_width)
        } else {
            let half = phase.transition_width / 2.0;
            (phase.start_progress - half, phase.start_progress + half)
        }
    }

    fn exit_ramp(phase: &Phase) -> (f64, f64) {
        let half = phase.transition_width / 2.0;
        (phase.end_progress - half, phase.end_progress + half)
    }

    /// Visual state of every phase at `progress`. Pure: the same input always
    /// gives the same output.
    pub fn evaluate(&self, progress: f64) -> Vec<PhaseState> {
        let progress = progress.clamp(0.0, 1.0);
        let last = self.phases.len() - 1;
        self.phases
            .iter()
            .map(|phase| {
                let (entry_from, entry_to) = Self::entry_ramp(phase);
                let entered = ramp(progress, entry_from, entry_to);
                let exited = if phase.index == last {
                    0.0
                } else {
                    let (exit_from, exit_to) = Self::exit_ramp(phase);
                    ramp(progress, exit_from, exit_to)
                };
                let offset = if exited > 0.0 {
                    -self.settle_distance * exited
                } else {
                    self.settle_distance * (1.0 - entered)
                };
                PhaseState {
                    phase_index: phase.index,
                    opacity: (entered * (1.0 - exited)).clamp(0.0, 1.0),
                    offset,
                }
            })
            .collect()
    }

    /// The most visible phase, if any phase is visible at all.
    pub fn active_phase(&self, progress: f64) -> Option<usize> {
        self.evaluate(progress)
            .into_iter()
            .filter(|state| state.opacity > 0.0)
            .max_by(|a, b| a.opacity.total_cmp(&b.opacity))
            .map(|state| state.phase_index)
    }
}

/// Opacity of a header that fades out over the first half of a progress range
/// and stays gone for the second half.
pub fn header_opacity(progress: f64) -> f64 {
    (1.0 - 2.0 * progress.clamp(0.0, 1.0)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    impl PhaseTimeline {
        fn phases(&self) -> &[Phase] {
            &self.phases
        }
    }

    fn hero() -> PhaseTimeline {
        PhaseTimeline::contiguous(0.2, 1.0, 4, 0.08, 40.0).unwrap()
    }

    fn opacities(timeline: &PhaseTimeline, progress: f64) -> Vec<f64> {
        timeline.evaluate(progress).iter().map(|s| s.opacity).collect()
    }

    #[test]
    fn nothing_is_visible_before_the_first_window() {
        let timeline = hero();
        assert_eq!(opacities(&timeline, 0.1), vec![0.0; 4]);
        assert_eq!(timeline.active_phase(0.1), None);
        let states = timeline.evaluate(0.0);
        assert!(states.iter().all(|s| s.offset == 40.0));
    }

    #[test]
    fn first_phase_ramps_in() {
        let values = opacities(&hero(), 0.22);
        assert!((values[0] - 0.25).abs() < 1e-9);
        assert_eq!(&values[1..], &[0.0, 0.0, 0.0]);
        let offset = hero().evaluate(0.22)[0].offset;
        assert!(offset > 0.0 && offset < 40.0);
    }

    #[test]
    fn middle_of_second_window_shows_only_phase_one() {
        let timeline = hero();
        assert_eq!(opacities(&timeline, 0.5), vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(timeline.evaluate(0.5)[1].offset, 0.0);
        assert_eq!(timeline.active_phase(0.5), Some(1));
    }

    #[test]
    fn neighbours_cross_fade_at_the_boundary() {
        let values = opacities(&hero(), 0.4);
        assert!((values[0] - 0.5).abs() < 1e-6);
        assert!((values[1] - 0.5).abs() < 1e-6);
        assert_eq!(values[2], 0.0);
    }

    #[test]
    fn passed_phases_rest_above_pending_phases_below() {
        let states = hero().evaluate(0.7);
        assert_eq!(states[0].offset, -40.0);
        assert_eq!(states[0].opacity, 0.0);
        assert_eq!(states[3].offset, 40.0);
        assert_eq!(states[3].opacity, 0.0);
    }

    #[test]
    fn last_phase_stays_resolved() {
        let timeline = hero();
        for progress in [0.85, 0.9, 0.95, 1.0, 1.5] {
            let state = timeline.evaluate(progress)[3];
            assert_eq!(state.opacity, 1.0, "at {progress}");
            assert_eq!(state.offset, 0.0);
        }
    }

    #[test]
    fn opacities_bounded_and_at_most_two_visible() {
        let timeline = hero();
        for step in 0..=1000 {
            let progress = step as f64 / 1000.0;
            let values = opacities(&timeline, progress);
            assert!(values.iter().all(|o| (0.0..=1.0).contains(o)));
            let visible = values.iter().filter(|o| **o > 0.0).count();
            assert!(visible <= 2, "{visible} phases visible at {progress}");
            if visible == 2 {
                let inside_transition = timeline.phases().iter().skip(1).any(|phase| {
                    (progress - phase.start_progress).abs() <= phase.transition_width / 2.0 + 1e-9
                });
                assert!(inside_transition, "two phases visible outside a transition at {progress}");
            }
        }
    }

    #[test]
    fn evaluate_is_idempotent() {
        let timeline = hero();
        for progress in [0.0, 0.21, 0.4, 0.63, 1.0] {
            assert_eq!(timeline.evaluate(progress), timeline.evaluate(progress));
        }
    }

    #[test]
    fn invalid_windows_are_rejected() {
        assert_eq!(PhaseTimeline::new(&[], 0.1, 0.0), Err(MotionError::Empty("phase timeline")));
        assert!(matches!(
            PhaseTimeline::new(&[(0.5, 0.4)], 0.0, 0.0),
            Err(MotionError::InvalidPhaseWindow { index: 0, .. })
        ));
        assert!(matches!(
            PhaseTimeline::new(&[(0.0, 0.5), (0.4, 1.0)], 0.05, 0.0),
            Err(MotionError::OverlappingPhases { index: 1 })
        ));
        assert!(matches!(
            PhaseTimeline::new(&[(0.0, 0.1), (0.1, 1.0)], 0.2, 0.0),
            Err(MotionError::TransitionTooWide { index: 0, .. })
        ));
    }

    #[test]
    fn header_fades_out_by_half_progress() {
        assert_eq!(header_opacity(0.0), 1.0);
        assert_eq!(header_opacity(0.25), 0.5);
        assert_eq!(header_opacity(0.5), 0.0);
        assert_eq!(header_opacity(0.9), 0.0);
        assert_eq!(header_opacity(-1.0), 1.0);
    }
}
