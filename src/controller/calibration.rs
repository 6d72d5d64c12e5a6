//! One-shot discovery of the calibration offsets
//!
//! The user pushes the right stick fully one way and back the other, then
//! presses and releases the lower face button. The raw indices that reacted
//! are compared with the profile's base indices to get the offsets.
//!
//! ```text
//! Start ──start()──► Axes ──stick swing──► Buttons ──press/release──► Done
//!                     │                       │                        │
//!                     └──────abort()──────────┴──► Abort               │
//!                                                   │                  │
//!          Start ◄──────────acknowledge()───────────┴──────────────────┘
//! ```

use crate::controller::profile::{
    AxisRole, ButtonRole, CalibrationOffsets, ControllerProfile,
};
use crate::host::{AXIS_COUNT, BUTTON_COUNT};
use std::fmt;
use tracing::{debug, info, warn};

/// Centred axis sample above which an index is marked
pub const AXIS_HIGH_THRESHOLD: f32 = 0.75;
/// Centred axis sample below which a marked index is accepted
pub const AXIS_LOW_THRESHOLD: f32 = -0.75;

const BUTTON_RELEASED: f32 = 0.25;
const BUTTON_PRESSED: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    #[default]
    Start,
    Axes,
    Buttons,
    Abort,
    Done,
}

impl fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            CalibrationState::Start => "Press Calibrate to begin",
            CalibrationState::Axes => "Move the right stick fully up, then fully down",
            CalibrationState::Buttons => "Press and release the A / Cross button",
            CalibrationState::Abort => "Calibration aborted",
            CalibrationState::Done => "Calibration done",
        };
        write!(f, "{}", message)
    }
}

/// What the sequencer looks for, derived from the active profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTarget {
    /// Base index of the right stick Y axis
    pub axis_index: usize,
    /// Base index of the lower face button
    pub button_index: usize,
    /// Smallest and largest base axis index in the profile
    pub axis_span: (usize, usize),
    /// Smallest and largest base button index in the profile
    pub button_span: (usize, usize),
}

impl CalibrationTarget {
    pub fn for_profile(profile: &ControllerProfile) -> Option<Self> {
        let axes: Vec<usize> = AxisRole::ALL
            .iter()
            .filter_map(|role| profile.axis(*role))
            .collect();
        let buttons: Vec<usize> = ButtonRole::ALL
            .iter()
            .filter_map(|role| profile.button(*role))
            .collect();

        Some(Self {
            axis_index: profile.axis(AxisRole::RightY)?,
            button_index: profile.button(ButtonRole::FaceDown)?,
            axis_span: (*axes.iter().min()?, *axes.iter().max()?),
            button_span: (*buttons.iter().min()?, *buttons.iter().max()?),
        })
    }

    fn axis_offset_fits(&self, offset: i64) -> bool {
        span_fits(self.axis_span, offset, AXIS_COUNT)
    }

    fn button_offset_fits(&self, offset: i64) -> bool {
        span_fits(self.button_span, offset, BUTTON_COUNT)
    }
}

fn span_fits((low, high): (usize, usize), offset: i64, len: usize) -> bool {
    low as i64 + offset >= 0 && (high as i64 + offset) < len as i64
}

/// Progress of one button index through released → pressed → released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ButtonTrace {
    #[default]
    Unseen,
    Released,
    Pressed,
}

/// Result of feeding one frame of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    /// Nothing detected yet, or the sequencer is idle
    Waiting,
    /// The axis offset was found and the sequencer moved on to buttons
    AxisFound(i32),
    /// Both offsets are known
    Complete(CalibrationOffsets),
}

#[derive(Debug)]
pub struct CalibrationSequencer {
    state: CalibrationState,
    target: Option<CalibrationTarget>,
    axis_marks: Vec<bool>,
    button_traces: Vec<ButtonTrace>,
    axis_offset: i32,
    result: Option<CalibrationOffsets>,
}

impl Default for CalibrationSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationSequencer {
    pub fn new() -> Self {
        Self {
            state: CalibrationState::Start,
            target: None,
            axis_marks: vec![false; AXIS_COUNT],
            button_traces: vec![ButtonTrace::Unseen; BUTTON_COUNT],
            axis_offset: 0,
            result: None,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// True while stick input belongs to the sequencer
    pub fn is_collecting(&self) -> bool {
        matches!(self.state, CalibrationState::Axes | CalibrationState::Buttons)
    }

    /// Offsets found by the last completed run
    pub fn result(&self) -> Option<CalibrationOffsets> {
        self.result
    }

    pub fn status(&self) -> String {
        self.state.to_string()
    }

    /// Begins detection. Only honoured from Start.
    pub fn start(&mut self, target: CalibrationTarget) -> bool {
        if self.state != CalibrationState::Start {
            warn!("Calibration already in state {:?}", self.state);
            return false;
        }
        self.clear_marks();
        self.target = Some(target);
        self.result = None;
        self.state = CalibrationState::Axes;
        info!("Calibration started, expecting right stick Y at base {}", target.axis_index);
        true
    }

    pub fn abort(&mut self) {
        if self.is_collecting() {
            info!("Calibration aborted in state {:?}", self.state);
            self.clear_marks();
            self.state = CalibrationState::Abort;
        }
    }

    /// Returns to Start after Done or Abort was shown to the user
    pub fn acknowledge(&mut self) {
        if matches!(self.state, CalibrationState::Done | CalibrationState::Abort) {
            self.clear_marks();
            self.target = None;
            self.state = CalibrationState::Start;
        }
    }

    /// Feeds one frame of centred axis samples in [-1, 1] and button samples in [0, 1]
    pub fn update(&mut self, axes: &[f32], buttons: &[f32]) -> CalibrationStep {
        let Some(target) = self.target else {
            return CalibrationStep::Waiting;
        };
        match self.state {
            CalibrationState::Axes => self.detect_axis(target, axes),
            CalibrationState::Buttons => self.detect_button(target, buttons),
            _ => CalibrationStep::Waiting,
        }
    }

    fn detect_axis(&mut self, target: CalibrationTarget, axes: &[f32]) -> CalibrationStep {
        for (index, &value) in axes.iter().enumerate().take(AXIS_COUNT) {
            if value > AXIS_HIGH_THRESHOLD {
                if !self.axis_marks[index] {
                    debug!("Axis {} marked as right stick Y candidate", index);
                }
                self.axis_marks[index] = true;
            } else if value < AXIS_LOW_THRESHOLD && self.axis_marks[index] {
                let offset = index as i64 - target.axis_index as i64;
                if !target.axis_offset_fits(offset) {
                    warn!("Axis {} would give unusable offset {}", index, offset);
                    self.axis_marks[index] = false;
                    continue;
                }

                self.axis_offset = offset as i32;
                self.axis_marks.fill(false);
                self.state = CalibrationState::Buttons;
                info!("Axis offset detected: {} (raw index {})", offset, index);
                return CalibrationStep::AxisFound(self.axis_offset);
            }
        }
        CalibrationStep::Waiting
    }

    fn detect_button(&mut self, target: CalibrationTarget, buttons: &[f32]) -> CalibrationStep {
        for (index, &value) in buttons.iter().enumerate().take(BUTTON_COUNT) {
            let trace = self.button_traces[index];
            let next = if value < BUTTON_RELEASED {
                match trace {
                    ButtonTrace::Pressed => {
                        let offset = index as i64 - target.button_index as i64;
                        if target.button_offset_fits(offset) {
                            return self.finish(offset as i32, index);
                        }
                        warn!("Button {} would give unusable offset {}", index, offset);
                        ButtonTrace::Released
                    }
                    _ => ButtonTrace::Released,
                }
            } else if value > BUTTON_PRESSED && trace == ButtonTrace::Released {
                ButtonTrace::Pressed
            } else {
                trace
            };
            self.button_traces[index] = next;
        }
        CalibrationStep::Waiting
    }

    fn finish(&mut self, button_offset: i32, index: usize) -> CalibrationStep {
        let offsets = CalibrationOffsets {
            axis_offset: self.axis_offset,
            button_offset,
        };
        info!(
            "Button offset detected: {} (raw index {}), calibration complete",
            button_offset, index
        );
        self.clear_marks();
        self.result = Some(offsets);
        self.state = CalibrationState::Done;
        CalibrationStep::Complete(offsets)
    }

    fn clear_marks(&mut self) {
        self.axis_marks.fill(false);
        self.button_traces.fill(ButtonTrace::Unseen);
    }

    #[cfg(test)]
    fn marked_axes(&self) -> usize {
        self.axis_marks.iter().filter(|m| **m).count()
    }

    #[cfg(test)]
    fn traced_buttons(&self) -> usize {
        self.button_traces
            .iter()
            .filter(|t| **t != ButtonTrace::Unseen)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> CalibrationTarget {
        CalibrationTarget {
            axis_index: 4,
            button_index: 0,
            axis_span: (0, 5),
            button_span: (0, 14),
        }
    }

    fn axes_with(index: usize, value: f32) -> Vec<f32> {
        let mut axes = vec![0.0; AXIS_COUNT];
        axes[index] = value;
        axes
    }

    fn buttons_with(pressed: &[usize]) -> Vec<f32> {
        let mut buttons = vec![0.0; BUTTON_COUNT];
        for index in pressed {
            buttons[*index] = 1.0;
        }
        buttons
    }

    #[test]
    fn test_axis_offset_from_stick_swing() {
        let mut sequencer = CalibrationSequencer::new();
        assert!(sequencer.start(target()));
        assert_eq!(sequencer.state(), CalibrationState::Axes);

        let idle = buttons_with(&[]);
        assert_eq!(sequencer.update(&axes_with(7, 0.9), &idle), CalibrationStep::Waiting);
        assert_eq!(
            sequencer.update(&axes_with(7, -0.9), &idle),
            CalibrationStep::AxisFound(3)
        );
        assert_eq!(sequencer.state(), CalibrationState::Buttons);
        assert_eq!(sequencer.marked_axes(), 0);
    }

    #[test]
    fn test_unmarked_low_axis_is_ignored() {
        let mut sequencer = CalibrationSequencer::new();
        sequencer.start(target());
        let idle = buttons_with(&[]);

        assert_eq!(sequencer.update(&axes_with(9, -0.9), &idle), CalibrationStep::Waiting);
        assert_eq!(sequencer.state(), CalibrationState::Axes);
    }

    #[test]
    fn test_button_needs_release_press_release() {
        let mut sequencer = CalibrationSequencer::new();
        sequencer.start(target());
        let idle = buttons_with(&[]);
        sequencer.update(&axes_with(7, 0.9), &idle);
        sequencer.update(&axes_with(7, -0.9), &idle);

        let axes = vec![0.0; AXIS_COUNT];
        // Button 30 powers on pressed and must never qualify
        assert_eq!(sequencer.update(&axes, &buttons_with(&[30])), CalibrationStep::Waiting);
        assert_eq!(sequencer.update(&axes, &buttons_with(&[30, 20])), CalibrationStep::Waiting);
        let step = sequencer.update(&axes, &buttons_with(&[30]));

        assert_eq!(
            step,
            CalibrationStep::Complete(CalibrationOffsets {
                axis_offset: 3,
                button_offset: 20,
            })
        );
        assert_eq!(sequencer.state(), CalibrationState::Done);
        assert_eq!(sequencer.traced_buttons(), 0);
        assert_eq!(
            sequencer.result(),
            Some(CalibrationOffsets {
                axis_offset: 3,
                button_offset: 20,
            })
        );
    }

    #[test]
    fn test_out_of_range_offset_is_rejected() {
        let mut sequencer = CalibrationSequencer::new();
        sequencer.start(CalibrationTarget {
            axis_index: 4,
            button_index: 0,
            axis_span: (0, 5),
            button_span: (0, 14),
        });
        let idle = buttons_with(&[]);

        // 99 - 4 = 95 pushes the highest base index (5) past the array end
        sequencer.update(&axes_with(99, 0.9), &idle);
        assert_eq!(sequencer.update(&axes_with(99, -0.9), &idle), CalibrationStep::Waiting);
        assert_eq!(sequencer.state(), CalibrationState::Axes);
    }

    #[test]
    fn test_abort_clears_marks_and_acknowledge_resets() {
        let mut sequencer = CalibrationSequencer::new();
        sequencer.start(target());
        sequencer.update(&axes_with(12, 0.9), &buttons_with(&[]));
        assert_eq!(sequencer.marked_axes(), 1);

        sequencer.abort();
        assert_eq!(sequencer.state(), CalibrationState::Abort);
        assert_eq!(sequencer.marked_axes(), 0);
        assert_eq!(sequencer.status(), "Calibration aborted");

        sequencer.acknowledge();
        assert_eq!(sequencer.state(), CalibrationState::Start);

        // A stale mark from the aborted run must not complete a new one
        sequencer.start(target());
        assert_eq!(
            sequencer.update(&axes_with(12, -0.9), &buttons_with(&[])),
            CalibrationStep::Waiting
        );
    }

    #[test]
    fn test_start_only_from_start() {
        let mut sequencer = CalibrationSequencer::new();
        assert!(sequencer.start(target()));
        assert!(!sequencer.start(target()));
    }
}
