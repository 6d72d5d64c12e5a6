//! Custom host commands exposed by the plugin
//!
//! Every command is registered under [`COMMAND_PREFIX`] when the plugin is
//! enabled and removed again when it is disabled. The table maps the host's
//! opaque handles back to [`CustomCommand`] so the session can dispatch by
//! enum instead of by string.

use crate::host::{CommandRef, Host};
use std::collections::HashMap;
use tracing::{debug, info};

pub const COMMAND_PREFIX: &str = "flightpad/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomCommand {
    ViewModifier,
    SwitchView,
    PropModifier,
    MixtureModifier,
    CowlModifier,
    TrimModifier,
    MouseOrKeyboard,
    SpeedbrakeOrCarbHeat,
    AutopilotOrFlightDirector,
    BetaOrReverse,
    MouseLeft,
    MouseRight,
    ScrollUp,
    ScrollDown,
    KeyboardUp,
    KeyboardDown,
    KeyboardLeft,
    KeyboardRight,
    KeyboardPress,
    KeyboardLock,
    Calibrate,
    CalibrateAbort,
    ApplyDefaults,
}

impl CustomCommand {
    pub const ALL: [CustomCommand; 23] = [
        CustomCommand::ViewModifier,
        CustomCommand::SwitchView,
        CustomCommand::PropModifier,
        CustomCommand::MixtureModifier,
        CustomCommand::CowlModifier,
        CustomCommand::TrimModifier,
        CustomCommand::MouseOrKeyboard,
        CustomCommand::SpeedbrakeOrCarbHeat,
        CustomCommand::AutopilotOrFlightDirector,
        CustomCommand::BetaOrReverse,
        CustomCommand::MouseLeft,
        CustomCommand::MouseRight,
        CustomCommand::ScrollUp,
        CustomCommand::ScrollDown,
        CustomCommand::KeyboardUp,
        CustomCommand::KeyboardDown,
        CustomCommand::KeyboardLeft,
        CustomCommand::KeyboardRight,
        CustomCommand::KeyboardPress,
        CustomCommand::KeyboardLock,
        CustomCommand::Calibrate,
        CustomCommand::CalibrateAbort,
        CustomCommand::ApplyDefaults,
    ];

    /// Name without the prefix
    pub fn short_name(self) -> &'static str {
        match self {
            CustomCommand::ViewModifier => "view_modifier",
            CustomCommand::SwitchView => "switch_view",
            CustomCommand::PropModifier => "prop_modifier",
            CustomCommand::MixtureModifier => "mixture_modifier",
            CustomCommand::CowlModifier => "cowl_modifier",
            CustomCommand::TrimModifier => "trim_modifier",
            CustomCommand::MouseOrKeyboard => "mouse_or_keyboard",
            CustomCommand::SpeedbrakeOrCarbHeat => "speedbrake_or_carb_heat",
            CustomCommand::AutopilotOrFlightDirector => "autopilot_or_fd",
            CustomCommand::BetaOrReverse => "beta_or_reverse",
            CustomCommand::MouseLeft => "mouse_left",
            CustomCommand::MouseRight => "mouse_right",
            CustomCommand::ScrollUp => "scroll_up",
            CustomCommand::ScrollDown => "scroll_down",
            CustomCommand::KeyboardUp => "keyboard_up",
            CustomCommand::KeyboardDown => "keyboard_down",
            CustomCommand::KeyboardLeft => "keyboard_left",
            CustomCommand::KeyboardRight => "keyboard_right",
            CustomCommand::KeyboardPress => "keyboard_press",
            CustomCommand::KeyboardLock => "keyboard_lock",
            CustomCommand::Calibrate => "calibrate",
            CustomCommand::CalibrateAbort => "calibrate_abort",
            CustomCommand::ApplyDefaults => "apply_defaults",
        }
    }

    /// Full host command name
    pub fn name(self) -> String {
        format!("{}{}", COMMAND_PREFIX, self.short_name())
    }

    pub fn description(self) -> &'static str {
        match self {
            CustomCommand::ViewModifier => "Hold to look around with the left stick",
            CustomCommand::SwitchView => "Cycle cockpit, forward and chase views",
            CustomCommand::PropModifier => "Hold to set prop or rotor speed with the left stick",
            CustomCommand::MixtureModifier => "Hold to set mixture with the left stick",
            CustomCommand::CowlModifier => "Hold to set cowl flaps with the left stick",
            CustomCommand::TrimModifier => "Hold to trim with the D-pad and face buttons",
            CustomCommand::MouseOrKeyboard => "Toggle mouse control, hold for the keyboard",
            CustomCommand::SpeedbrakeOrCarbHeat => "Toggle speedbrake or carb heat, hold to arm",
            CustomCommand::AutopilotOrFlightDirector => "Toggle autopilot, hold for flight director off",
            CustomCommand::BetaOrReverse => "Toggle beta, hold for reverse thrust",
            CustomCommand::MouseLeft => "Left mouse button",
            CustomCommand::MouseRight => "Right mouse button",
            CustomCommand::ScrollUp => "Scroll up",
            CustomCommand::ScrollDown => "Scroll down",
            CustomCommand::KeyboardUp => "Keyboard selector up",
            CustomCommand::KeyboardDown => "Keyboard selector down",
            CustomCommand::KeyboardLeft => "Keyboard selector left",
            CustomCommand::KeyboardRight => "Keyboard selector right",
            CustomCommand::KeyboardPress => "Press the selected key",
            CustomCommand::KeyboardLock => "Lock the selected modifier key",
            CustomCommand::Calibrate => "Start controller calibration",
            CustomCommand::CalibrateAbort => "Abort controller calibration",
            CustomCommand::ApplyDefaults => "Restore the default assignments",
        }
    }
}

/// Registered custom commands and their host handles
#[derive(Debug, Default)]
pub struct CommandTable {
    by_ref: HashMap<CommandRef, CustomCommand>,
    by_command: HashMap<CustomCommand, CommandRef>,
}

impl CommandTable {
    /// Creates every custom command on the host and registers its handler
    pub fn register(host: &mut dyn Host) -> Self {
        let mut table = Self::default();
        for command in CustomCommand::ALL {
            let handle = host.create_command(&command.name(), command.description());
            host.register_command_handler(handle);
            table.by_ref.insert(handle, command);
            table.by_command.insert(command, handle);
        }
        info!("Registered {} custom commands", table.by_ref.len());
        table
    }

    pub fn unregister(&mut self, host: &mut dyn Host) {
        for handle in self.by_ref.keys() {
            host.unregister_command_handler(*handle);
        }
        debug!("Unregistered {} custom commands", self.by_ref.len());
        self.by_ref.clear();
        self.by_command.clear();
    }

    pub fn lookup(&self, handle: CommandRef) -> Option<CustomCommand> {
        self.by_ref.get(&handle).copied()
    }

    pub fn handle(&self, command: CustomCommand) -> Option<CommandRef> {
        self.by_command.get(&command).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_prefixed() {
        let names: HashSet<String> = CustomCommand::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), CustomCommand::ALL.len());
        assert!(names.iter().all(|n| n.starts_with(COMMAND_PREFIX)));
    }

    #[test]
    fn test_register_and_unregister() {
        let mut host = MemoryHost::new();
        let mut table = CommandTable::register(&mut host);
        assert_eq!(host.registered_handler_count(), CustomCommand::ALL.len());

        let handle = table.handle(CustomCommand::TrimModifier).unwrap();
        assert_eq!(table.lookup(handle), Some(CustomCommand::TrimModifier));
        assert_eq!(host.command_name(handle), Some("flightpad/trim_modifier"));

        table.unregister(&mut host);
        assert_eq!(host.registered_handler_count(), 0);
        assert!(table.is_empty());
    }
}
