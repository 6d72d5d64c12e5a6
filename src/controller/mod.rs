//! Controller subsystem
//!
//! 1. [`profile`] - Role tables per controller family and the index mapper
//! 2. [`calibration`] - Offset detection from a guided stick and button test
//! 3. [`touchpad`] - DualShock 4 touchpad reader on its own thread
//!
//! # Architecture
//!
//! ```text
//! Host axis/button arrays ──► IndexMapper ──► role-based engine code
//!                                ▲
//!          CalibrationSequencer ─┘ (offsets)
//!
//! HID reports ──► TouchpadFeed ──► InputInjector
//! ```

pub mod calibration;
pub mod profile;
pub mod touchpad;

pub use calibration::{CalibrationSequencer, CalibrationState, CalibrationStep};
pub use profile::{AxisRole, ButtonRole, CalibrationOffsets, ControllerType, IndexMapper};
pub use touchpad::{TouchpadError, TouchpadFeed};
