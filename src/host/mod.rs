//! Host simulator interface
//!
//! Everything the plugin needs from the simulator process goes through the
//! [`Host`] trait: the dataref store, the command registry and the plugin
//! enablement query. OS input injection lives behind [`InputInjector`]
//! because it is shared with the touchpad thread.
//!
//! # Architecture
//!
//! ```text
//! Host callbacks ──► Session ──► Host (datarefs, commands)
//!                       │
//!                       └──────► InputInjector (pointer, keys)
//! ```
//!
//! Lookups never fail loudly: a missing dataref reads as `None`, a write to a
//! missing dataref is dropped, and a missing command is `None`.

pub mod datarefs;
pub mod memory;

use std::fmt;
use std::num::NonZeroU64;

pub use memory::{InjectedEvent, MemoryHost, RecordingInjector};

/// Number of axis slots the host exposes per joystick table
pub const AXIS_COUNT: usize = 100;

/// Number of button slots the host exposes per joystick table
pub const BUTTON_COUNT: usize = 1600;

/// Opaque handle to a host command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandRef(NonZeroU64);

impl CommandRef {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for CommandRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// One slot of the button assignment table
pub type AssignmentSlot = Option<CommandRef>;

/// Lifecycle phase of a host-dispatched command (key-down / repeat / key-up)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandPhase {
    Begin,
    Continue,
    End,
}

/// Notifications forwarded from the host message hook
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluginMessage {
    AircraftLoaded,
    AirportLoaded,
}

/// Plugin-owned windows whose visibility the core toggles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Overlay {
    /// Small indicator showing the pointer-emulation state
    Mouse,
    /// On-screen keyboard
    Keyboard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// Access to the host simulator
///
/// Implemented by the real plugin glue and by [`MemoryHost`] for tests and
/// the bench binary. All methods are called from the frame/command thread.
pub trait Host {
    fn get_f32(&self, path: &str) -> Option<f32>;
    fn set_f32(&mut self, path: &str, value: f32);
    fn get_i32(&self, path: &str) -> Option<i32>;
    fn set_i32(&mut self, path: &str, value: i32);

    /// Copies the array dataref into `out` starting at element 0 and returns
    /// how many elements were copied (0 if the dataref does not exist)
    fn get_f32_array(&self, path: &str, out: &mut [f32]) -> usize;
    fn set_f32_array(&mut self, path: &str, values: &[f32]);
    fn get_i32_array(&self, path: &str, out: &mut [i32]) -> usize;
    fn set_i32_array(&mut self, path: &str, values: &[i32]);

    /// Copies the live button assignment table into `out`
    fn read_button_assignments(&self, out: &mut [AssignmentSlot]);

    /// Overwrites the live button assignment table starting at `offset`
    fn write_button_assignments(&mut self, offset: usize, values: &[AssignmentSlot]);

    fn find_command(&self, name: &str) -> Option<CommandRef>;
    fn create_command(&mut self, name: &str, description: &str) -> CommandRef;
    fn register_command_handler(&mut self, command: CommandRef);
    fn unregister_command_handler(&mut self, command: CommandRef);
    fn command_once(&mut self, command: CommandRef);
    fn command_begin(&mut self, command: CommandRef);
    fn command_end(&mut self, command: CommandRef);

    /// Whether a third-party plugin with this signature is loaded and enabled
    fn is_plugin_enabled(&self, signature: &str) -> bool;

    fn set_overlay_visible(&mut self, overlay: Overlay, visible: bool);

    /// Seconds since the simulator started
    fn running_time(&self) -> f32 {
        self.get_f32(datarefs::TOTAL_RUNNING_TIME).unwrap_or(0.0)
    }

    /// Runs the named command once if it exists
    fn command_once_named(&mut self, name: &str) -> bool {
        match self.find_command(name) {
            Some(command) => {
                self.command_once(command);
                true
            }
            None => {
                tracing::debug!("Command not available: {}", name);
                false
            }
        }
    }
}

/// OS-level synthetic input
///
/// Shared between the frame thread and the touchpad thread, so every method
/// takes `&self`.
pub trait InputInjector: Send + Sync {
    fn move_pointer(&self, dx: i32, dy: i32);
    fn mouse_button(&self, button: MouseButton, down: bool);
    fn scroll(&self, clicks: i32);
    fn key(&self, code: u32, down: bool);
}
