//! Controller profiles and the abstract-role to raw-index mapper
//!
//! The host exposes every connected device as one flat axis array and one
//! flat button array. Where a given stick or button lands depends on the
//! controller family, the platform's HID enumeration and how many other
//! devices come first. The first two are captured by the constant tables in
//! this module, the last one by [`CalibrationOffsets`].

use crate::host::{AXIS_COUNT, BUTTON_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported controller families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControllerType {
    #[default]
    Xbox,
    PlayStation,
}

impl ControllerType {
    pub const ALL: [ControllerType; 2] = [ControllerType::Xbox, ControllerType::PlayStation];

    pub fn profile(self) -> &'static ControllerProfile {
        match self {
            ControllerType::Xbox => &table::XBOX,
            ControllerType::PlayStation => &table::PLAYSTATION,
        }
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerType::Xbox => write!(f, "Xbox"),
            ControllerType::PlayStation => write!(f, "PlayStation"),
        }
    }
}

/// Logical axis identity, independent of the physical layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisRole {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

impl AxisRole {
    pub const ALL: [AxisRole; 6] = [
        AxisRole::LeftX,
        AxisRole::LeftY,
        AxisRole::RightX,
        AxisRole::RightY,
        AxisRole::LeftTrigger,
        AxisRole::RightTrigger,
    ];
}

/// Logical button identity, independent of the physical layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonRole {
    DpadUp,
    DpadUpRight,
    DpadRight,
    DpadDownRight,
    DpadDown,
    DpadDownLeft,
    DpadLeft,
    DpadUpLeft,
    /// A / Cross
    FaceDown,
    /// B / Circle
    FaceRight,
    /// X / Square
    FaceLeft,
    /// Y / Triangle
    FaceUp,
    /// Back / Share
    CenterLeft,
    /// Start / Options
    CenterRight,
    BumperLeft,
    BumperRight,
    StickLeft,
    StickRight,
}

impl ButtonRole {
    pub const ALL: [ButtonRole; 18] = [
        ButtonRole::DpadUp,
        ButtonRole::DpadUpRight,
        ButtonRole::DpadRight,
        ButtonRole::DpadDownRight,
        ButtonRole::DpadDown,
        ButtonRole::DpadDownLeft,
        ButtonRole::DpadLeft,
        ButtonRole::DpadUpLeft,
        ButtonRole::FaceDown,
        ButtonRole::FaceRight,
        ButtonRole::FaceLeft,
        ButtonRole::FaceUp,
        ButtonRole::CenterLeft,
        ButtonRole::CenterRight,
        ButtonRole::BumperLeft,
        ButtonRole::BumperRight,
        ButtonRole::StickLeft,
        ButtonRole::StickRight,
    ];
}

/// Raw endpoints of the trigger used for toe brakes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrakeTrigger {
    pub axis: AxisRole,
    /// Raw value with the trigger released
    pub released: f32,
    /// Raw value with the trigger fully pulled
    pub pressed: f32,
}

/// Concrete index table for one controller family on this platform
#[derive(Debug)]
pub struct ControllerProfile {
    pub controller_type: ControllerType,
    pub name: &'static str,
    pub brake_trigger: BrakeTrigger,
    axes: &'static [(AxisRole, usize)],
    buttons: &'static [(ButtonRole, usize)],
}

impl ControllerProfile {
    /// Base index of an axis before the calibration offset
    pub fn axis(&self, role: AxisRole) -> Option<usize> {
        self.axes
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, index)| *index)
    }

    /// Base index of a button before the calibration offset
    pub fn button(&self, role: ButtonRole) -> Option<usize> {
        self.buttons
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, index)| *index)
    }
}

/// Per-user enumeration drift, learned by calibration and persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationOffsets {
    pub axis_offset: i32,
    pub button_offset: i32,
}

/// Translates abstract roles to indices on the host's raw arrays
///
/// Returns `None` when the profile has no such control or when the offset
/// pushes the index outside the host array, so callers never touch an
/// invalid slot.
#[derive(Debug, Clone, Copy)]
pub struct IndexMapper {
    profile: &'static ControllerProfile,
    offsets: CalibrationOffsets,
}

impl IndexMapper {
    pub fn new(controller_type: ControllerType, offsets: CalibrationOffsets) -> Self {
        Self {
            profile: controller_type.profile(),
            offsets,
        }
    }

    pub fn profile(&self) -> &'static ControllerProfile {
        self.profile
    }

    pub fn offsets(&self) -> CalibrationOffsets {
        self.offsets
    }

    pub fn axis(&self, role: AxisRole) -> Option<usize> {
        map_axis(self.profile, self.offsets, role)
    }

    pub fn button(&self, role: ButtonRole) -> Option<usize> {
        map_button(self.profile, self.offsets, role)
    }
}

pub fn map_axis(
    profile: &ControllerProfile,
    offsets: CalibrationOffsets,
    role: AxisRole,
) -> Option<usize> {
    profile
        .axis(role)
        .and_then(|base| apply_offset(base, offsets.axis_offset, AXIS_COUNT))
}

pub fn map_button(
    profile: &ControllerProfile,
    offsets: CalibrationOffsets,
    role: ButtonRole,
) -> Option<usize> {
    profile
        .button(role)
        .and_then(|base| apply_offset(base, offsets.button_offset, BUTTON_COUNT))
}

fn apply_offset(base: usize, offset: i32, len: usize) -> Option<usize> {
    let index = base as i64 + i64::from(offset);
    if (0..len as i64).contains(&index) {
        Some(index as usize)
    } else {
        None
    }
}

// Raw indices differ per platform HID enumeration. The Xbox family reports
// the D-pad as four buttons, the PlayStation family as an eight-way hat.

#[cfg(target_os = "windows")]
mod table {
    use super::*;

    pub static XBOX: ControllerProfile = ControllerProfile {
        controller_type: ControllerType::Xbox,
        name: "Xbox (XInput)",
        // Both triggers share one axis resting at 0.5
        brake_trigger: BrakeTrigger {
            axis: AxisRole::LeftTrigger,
            released: 0.5,
            pressed: 1.0,
        },
        axes: &[
            (AxisRole::LeftX, 0),
            (AxisRole::LeftY, 1),
            (AxisRole::LeftTrigger, 2),
            (AxisRole::RightTrigger, 2),
            (AxisRole::RightX, 3),
            (AxisRole::RightY, 4),
        ],
        buttons: &[
            (ButtonRole::FaceDown, 0),
            (ButtonRole::FaceRight, 1),
            (ButtonRole::FaceLeft, 2),
            (ButtonRole::FaceUp, 3),
            (ButtonRole::BumperLeft, 4),
            (ButtonRole::BumperRight, 5),
            (ButtonRole::CenterLeft, 6),
            (ButtonRole::CenterRight, 7),
            (ButtonRole::StickLeft, 8),
            (ButtonRole::StickRight, 9),
            (ButtonRole::DpadUp, 10),
            (ButtonRole::DpadRight, 12),
            (ButtonRole::DpadDown, 14),
            (ButtonRole::DpadLeft, 16),
        ],
    };

    pub static PLAYSTATION: ControllerProfile = ControllerProfile {
        controller_type: ControllerType::PlayStation,
        name: "DualShock 4",
        brake_trigger: BrakeTrigger {
            axis: AxisRole::LeftTrigger,
            released: 0.0,
            pressed: 1.0,
        },
        axes: &[
            (AxisRole::LeftX, 0),
            (AxisRole::LeftY, 1),
            (AxisRole::RightX, 2),
            (AxisRole::LeftTrigger, 3),
            (AxisRole::RightTrigger, 4),
            (AxisRole::RightY, 5),
        ],
        buttons: &[
            (ButtonRole::FaceLeft, 0),
            (ButtonRole::FaceDown, 1),
            (ButtonRole::FaceRight, 2),
            (ButtonRole::FaceUp, 3),
            (ButtonRole::BumperLeft, 4),
            (ButtonRole::BumperRight, 5),
            (ButtonRole::CenterLeft, 8),
            (ButtonRole::CenterRight, 9),
            (ButtonRole::StickLeft, 10),
            (ButtonRole::StickRight, 11),
            (ButtonRole::DpadUp, 14),
            (ButtonRole::DpadUpRight, 15),
            (ButtonRole::DpadRight, 16),
            (ButtonRole::DpadDownRight, 17),
            (ButtonRole::DpadDown, 18),
            (ButtonRole::DpadDownLeft, 19),
            (ButtonRole::DpadLeft, 20),
            (ButtonRole::DpadUpLeft, 21),
        ],
    };
}

#[cfg(target_os = "macos")]
mod table {
    use super::*;

    pub static XBOX: ControllerProfile = ControllerProfile {
        controller_type: ControllerType::Xbox,
        name: "Xbox (360Controller)",
        brake_trigger: BrakeTrigger {
            axis: AxisRole::LeftTrigger,
            released: 0.0,
            pressed: 1.0,
        },
        axes: &[
            (AxisRole::LeftX, 0),
            (AxisRole::LeftY, 1),
            (AxisRole::RightX, 2),
            (AxisRole::RightY, 3),
            (AxisRole::LeftTrigger, 4),
            (AxisRole::RightTrigger, 5),
        ],
        buttons: &[
            (ButtonRole::DpadUp, 0),
            (ButtonRole::DpadDown, 1),
            (ButtonRole::DpadLeft, 2),
            (ButtonRole::DpadRight, 3),
            (ButtonRole::CenterRight, 4),
            (ButtonRole::CenterLeft, 5),
            (ButtonRole::StickLeft, 6),
            (ButtonRole::StickRight, 7),
            (ButtonRole::BumperLeft, 8),
            (ButtonRole::BumperRight, 9),
            (ButtonRole::FaceDown, 11),
            (ButtonRole::FaceRight, 12),
            (ButtonRole::FaceLeft, 13),
            (ButtonRole::FaceUp, 14),
        ],
    };

    pub static PLAYSTATION: ControllerProfile = ControllerProfile {
        controller_type: ControllerType::PlayStation,
        name: "DualShock 4",
        brake_trigger: BrakeTrigger {
            axis: AxisRole::LeftTrigger,
            released: 0.0,
            pressed: 1.0,
        },
        axes: &[
            (AxisRole::LeftX, 0),
            (AxisRole::LeftY, 1),
            (AxisRole::RightX, 2),
            (AxisRole::LeftTrigger, 3),
            (AxisRole::RightTrigger, 4),
            (AxisRole::RightY, 5),
        ],
        buttons: &[
            (ButtonRole::FaceLeft, 0),
            (ButtonRole::FaceDown, 1),
            (ButtonRole::FaceRight, 2),
            (ButtonRole::FaceUp, 3),
            (ButtonRole::BumperLeft, 4),
            (ButtonRole::BumperRight, 5),
            (ButtonRole::CenterLeft, 8),
            (ButtonRole::CenterRight, 9),
            (ButtonRole::StickLeft, 10),
            (ButtonRole::StickRight, 11),
            (ButtonRole::DpadUp, 14),
            (ButtonRole::DpadUpRight, 15),
            (ButtonRole::DpadRight, 16),
            (ButtonRole::DpadDownRight, 17),
            (ButtonRole::DpadDown, 18),
            (ButtonRole::DpadDownLeft, 19),
            (ButtonRole::DpadLeft, 20),
            (ButtonRole::DpadUpLeft, 21),
        ],
    };
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
mod table {
    use super::*;

    pub static XBOX: ControllerProfile = ControllerProfile {
        controller_type: ControllerType::Xbox,
        name: "Xbox (xpad)",
        brake_trigger: BrakeTrigger {
            axis: AxisRole::LeftTrigger,
            released: 0.0,
            pressed: 1.0,
        },
        axes: &[
            (AxisRole::LeftX, 0),
            (AxisRole::LeftY, 1),
            (AxisRole::LeftTrigger, 2),
            (AxisRole::RightX, 3),
            (AxisRole::RightY, 4),
            (AxisRole::RightTrigger, 5),
        ],
        buttons: &[
            (ButtonRole::FaceDown, 0),
            (ButtonRole::FaceRight, 1),
            (ButtonRole::FaceLeft, 2),
            (ButtonRole::FaceUp, 3),
            (ButtonRole::BumperLeft, 4),
            (ButtonRole::BumperRight, 5),
            (ButtonRole::CenterLeft, 6),
            (ButtonRole::CenterRight, 7),
            (ButtonRole::StickLeft, 9),
            (ButtonRole::StickRight, 10),
            (ButtonRole::DpadUp, 11),
            (ButtonRole::DpadRight, 12),
            (ButtonRole::DpadDown, 13),
            (ButtonRole::DpadLeft, 14),
        ],
    };

    pub static PLAYSTATION: ControllerProfile = ControllerProfile {
        controller_type: ControllerType::PlayStation,
        name: "DualShock 4 (hid-sony)",
        brake_trigger: BrakeTrigger {
            axis: AxisRole::LeftTrigger,
            released: 0.0,
            pressed: 1.0,
        },
        axes: &[
            (AxisRole::LeftX, 0),
            (AxisRole::LeftY, 1),
            (AxisRole::LeftTrigger, 2),
            (AxisRole::RightX, 3),
            (AxisRole::RightY, 4),
            (AxisRole::RightTrigger, 5),
        ],
        buttons: &[
            (ButtonRole::FaceDown, 0),
            (ButtonRole::FaceRight, 1),
            (ButtonRole::FaceUp, 2),
            (ButtonRole::FaceLeft, 3),
            (ButtonRole::BumperLeft, 4),
            (ButtonRole::BumperRight, 5),
            (ButtonRole::CenterLeft, 8),
            (ButtonRole::CenterRight, 9),
            (ButtonRole::StickLeft, 11),
            (ButtonRole::StickRight, 12),
            (ButtonRole::DpadUp, 13),
            (ButtonRole::DpadUpRight, 14),
            (ButtonRole::DpadRight, 15),
            (ButtonRole::DpadDownRight, 16),
            (ButtonRole::DpadDown, 17),
            (ButtonRole::DpadDownLeft, 18),
            (ButtonRole::DpadLeft, 19),
            (ButtonRole::DpadUpLeft, 20),
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_is_total_and_in_bounds() {
        let offsets = [
            CalibrationOffsets::default(),
            CalibrationOffsets {
                axis_offset: 7,
                button_offset: 40,
            },
            CalibrationOffsets {
                axis_offset: -3,
                button_offset: -1,
            },
            CalibrationOffsets {
                axis_offset: 99,
                button_offset: 1599,
            },
        ];

        for controller_type in ControllerType::ALL {
            for offset in offsets {
                let mapper = IndexMapper::new(controller_type, offset);
                for role in AxisRole::ALL {
                    if let Some(index) = mapper.axis(role) {
                        assert!(index < AXIS_COUNT);
                    }
                }
                for role in ButtonRole::ALL {
                    if let Some(index) = mapper.button(role) {
                        assert!(index < BUTTON_COUNT);
                    }
                }
            }
        }
    }

    #[test]
    fn test_offset_is_added_to_base_index() {
        let offsets = CalibrationOffsets {
            axis_offset: 3,
            button_offset: 20,
        };
        let mapper = IndexMapper::new(ControllerType::PlayStation, offsets);
        let profile = ControllerType::PlayStation.profile();

        let base = profile.axis(AxisRole::RightY).unwrap();
        assert_eq!(mapper.axis(AxisRole::RightY), Some(base + 3));

        let base = profile.button(ButtonRole::FaceDown).unwrap();
        assert_eq!(mapper.button(ButtonRole::FaceDown), Some(base + 20));
    }

    #[test]
    fn test_xbox_has_no_diagonals() {
        let mapper = IndexMapper::new(ControllerType::Xbox, CalibrationOffsets::default());
        for role in [
            ButtonRole::DpadUpRight,
            ButtonRole::DpadDownRight,
            ButtonRole::DpadDownLeft,
            ButtonRole::DpadUpLeft,
        ] {
            assert_eq!(mapper.button(role), None);
        }
        assert!(mapper.button(ButtonRole::DpadUp).is_some());
    }

    #[test]
    fn test_negative_offset_below_zero_is_unsupported() {
        let offsets = CalibrationOffsets {
            axis_offset: -1000,
            button_offset: -1000,
        };
        let mapper = IndexMapper::new(ControllerType::Xbox, offsets);
        assert_eq!(mapper.axis(AxisRole::LeftX), None);
        assert_eq!(mapper.button(ButtonRole::FaceDown), None);
    }

    #[test]
    fn test_every_profile_maps_the_calibration_roles() {
        for controller_type in ControllerType::ALL {
            let profile = controller_type.profile();
            assert!(profile.axis(AxisRole::RightY).is_some());
            assert!(profile.button(ButtonRole::FaceDown).is_some());
            assert!(profile.axis(profile.brake_trigger.axis).is_some());
        }
    }
}
