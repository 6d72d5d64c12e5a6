//! In-memory host used by the bench binary and the tests
//!
//! Behaves like the simulator for everything the plugin touches: datarefs are
//! plain maps, commands get sequential handles, and [`MemoryHost::dispatch_buttons`]
//! turns raw button transitions into command phases through the live
//! assignment table.

use super::{
    datarefs, AssignmentSlot, CommandPhase, CommandRef, Host, InputInjector, MouseButton, Overlay,
    AXIS_COUNT, BUTTON_COUNT,
};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU64;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct MemoryHost {
    floats: HashMap<String, f32>,
    ints: HashMap<String, i32>,
    float_arrays: HashMap<String, Vec<f32>>,
    int_arrays: HashMap<String, Vec<i32>>,

    button_assignments: Vec<AssignmentSlot>,

    commands: HashMap<String, CommandRef>,
    command_names: HashMap<CommandRef, String>,
    issued: u64,
    handlers: HashSet<CommandRef>,

    once_log: Vec<CommandRef>,
    held: HashSet<CommandRef>,

    plugins: HashSet<String>,
    overlays: HashSet<Overlay>,

    // Button index -> command begun by the host on press
    pressed: HashMap<usize, CommandRef>,
}

impl MemoryHost {
    /// Creates a host with centred axes, released buttons and empty
    /// assignment tables
    pub fn new() -> Self {
        let mut host = Self {
            button_assignments: vec![None; BUTTON_COUNT],
            ..Default::default()
        };

        host.float_arrays.insert(
            datarefs::JOYSTICK_AXIS_VALUES.to_string(),
            vec![0.5; AXIS_COUNT],
        );
        host.int_arrays.insert(
            datarefs::JOYSTICK_BUTTON_VALUES.to_string(),
            vec![0; BUTTON_COUNT],
        );
        host.int_arrays.insert(
            datarefs::JOYSTICK_AXIS_ASSIGNMENTS.to_string(),
            vec![0; AXIS_COUNT],
        );
        host.int_arrays.insert(
            datarefs::JOYSTICK_AXIS_REVERSE.to_string(),
            vec![0; AXIS_COUNT],
        );
        host.ints.insert(datarefs::HAS_JOYSTICK.to_string(), 1);
        host.floats
            .insert(datarefs::TOTAL_RUNNING_TIME.to_string(), 0.0);
        host.floats
            .insert(datarefs::JOYSTICK_PITCH_NULLZONE.to_string(), 0.1);
        host
    }

    /// Creates a host that also knows the simulator commands and engine
    /// datarefs the plugin uses
    pub fn with_default_aircraft() -> Self {
        use super::datarefs::commands::*;

        let mut host = Self::new();
        for name in [
            VIEW_3D_COCKPIT,
            VIEW_FORWARD_NOTHING,
            VIEW_CHASE,
            VIEW_FREE_CAMERA,
            PAN_LEFT,
            PAN_RIGHT,
            PAN_UP,
            PAN_DOWN,
            HEAD_FORWARD,
            HEAD_BACKWARD,
            BRAKES_TOGGLE_MAX,
            FLAPS_UP,
            FLAPS_DOWN,
            GEAR_TOGGLE,
            PARKING_BRAKE_TOGGLE,
            PITCH_TRIM_UP,
            PITCH_TRIM_DOWN,
            AILERON_TRIM_LEFT,
            AILERON_TRIM_RIGHT,
            RUDDER_TRIM_LEFT,
            RUDDER_TRIM_RIGHT,
            FORCE_TRIM,
            CARB_HEAT_TOGGLE,
            BETA_TOGGLE,
            THRUST_REVERSE_TOGGLE,
            AUTOPILOT_SERVOS_TOGGLE,
            FLIGHT_DIRECTOR_OFF,
        ] {
            host.define_command(name);
        }

        host.ints.insert(datarefs::NUM_ENGINES.to_string(), 1);
        host.ints.insert(datarefs::IS_HELICOPTER.to_string(), 0);
        host.ints.insert(datarefs::IS_GLIDER.to_string(), 0);
        host.ints.insert(datarefs::HAS_SPEEDBRAKE.to_string(), 0);
        for path in [
            datarefs::THROTTLE_RATIO_ALL,
            datarefs::MIXTURE_RATIO_ALL,
            datarefs::PROP_RATIO_ALL,
            datarefs::PROP_PITCH_DEG_ALL,
            datarefs::PROP_SPEED_RAD_SEC_ALL,
            datarefs::SPEEDBRAKE_RATIO,
            datarefs::LEFT_BRAKE_RATIO,
            datarefs::RIGHT_BRAKE_RATIO,
            datarefs::PILOTS_HEAD_PSI,
            datarefs::PILOTS_HEAD_THE,
            datarefs::PILOTS_HEAD_X,
            datarefs::PILOTS_HEAD_Y,
            datarefs::PILOTS_HEAD_Z,
        ] {
            host.floats.insert(path.to_string(), 0.0);
        }
        host.floats
            .insert(datarefs::GOVERNOR_MIN_RAD_SEC.to_string(), 20.0);
        host.floats
            .insert(datarefs::GOVERNOR_MAX_RAD_SEC.to_string(), 40.0);
        host.float_arrays
            .insert(datarefs::PROP_MIN_PITCH.to_string(), vec![-5.0; 16]);
        host.float_arrays
            .insert(datarefs::PROP_MAX_PITCH.to_string(), vec![15.0; 16]);
        host.float_arrays
            .insert(datarefs::COWL_FLAP_RATIO.to_string(), vec![0.0; 16]);
        host.float_arrays.insert(
            datarefs::THRUST_REVERSER_DEPLOY_RATIO.to_string(),
            vec![0.0; 16],
        );
        for path in [
            datarefs::OVERRIDE_TOE_BRAKES,
            datarefs::CINEMA_VERITE,
            datarefs::HEAD_SHAKE_OVERRIDE,
        ] {
            host.ints.insert(path.to_string(), 0);
        }
        host.ints
            .insert(datarefs::VIEW_TYPE.to_string(), datarefs::VIEW_TYPE_3D_COCKPIT);
        host
    }

    /// Registers a simulator-owned command and returns its handle
    pub fn define_command(&mut self, name: &str) -> CommandRef {
        if let Some(existing) = self.commands.get(name) {
            return *existing;
        }
        let command = CommandRef(NonZeroU64::MIN.saturating_add(self.issued));
        self.issued += 1;
        self.commands.insert(name.to_string(), command);
        self.command_names.insert(command, name.to_string());
        command
    }

    pub fn insert_f32(&mut self, path: &str, value: f32) {
        self.floats.insert(path.to_string(), value);
    }

    pub fn insert_i32(&mut self, path: &str, value: i32) {
        self.ints.insert(path.to_string(), value);
    }

    pub fn insert_f32_array(&mut self, path: &str, values: Vec<f32>) {
        self.float_arrays.insert(path.to_string(), values);
    }

    pub fn enable_plugin(&mut self, signature: &str) {
        self.plugins.insert(signature.to_string());
    }

    /// Sets one raw axis value (0..1, centre 0.5)
    pub fn set_axis(&mut self, index: usize, value: f32) {
        if let Some(axes) = self.float_arrays.get_mut(datarefs::JOYSTICK_AXIS_VALUES) {
            if let Some(slot) = axes.get_mut(index) {
                *slot = value;
            }
        }
    }

    pub fn set_button(&mut self, index: usize, pressed: bool) {
        if let Some(buttons) = self.int_arrays.get_mut(datarefs::JOYSTICK_BUTTON_VALUES) {
            if let Some(slot) = buttons.get_mut(index) {
                *slot = i32::from(pressed);
            }
        }
    }

    pub fn advance_time(&mut self, seconds: f32) {
        let now = self.running_time();
        self.floats
            .insert(datarefs::TOTAL_RUNNING_TIME.to_string(), now + seconds);
    }

    pub fn assignment(&self, index: usize) -> AssignmentSlot {
        self.button_assignments.get(index).copied().flatten()
    }

    pub fn assignments(&self) -> &[AssignmentSlot] {
        &self.button_assignments
    }

    pub fn axis_assignment(&self, index: usize) -> i32 {
        self.int_arrays
            .get(datarefs::JOYSTICK_AXIS_ASSIGNMENTS)
            .and_then(|a| a.get(index).copied())
            .unwrap_or(0)
    }

    pub fn command_name(&self, command: CommandRef) -> Option<&str> {
        self.command_names.get(&command).map(String::as_str)
    }

    pub fn is_handler_registered(&self, command: CommandRef) -> bool {
        self.handlers.contains(&command)
    }

    pub fn registered_handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// How often the named command ran through `command_once`
    pub fn once_count(&self, name: &str) -> usize {
        match self.commands.get(name) {
            Some(command) => self.once_log.iter().filter(|c| *c == command).count(),
            None => 0,
        }
    }

    /// Whether the named command was begun and not yet ended
    pub fn is_held(&self, name: &str) -> bool {
        self.commands
            .get(name)
            .is_some_and(|command| self.held.contains(command))
    }

    pub fn overlay_visible(&self, overlay: Overlay) -> bool {
        self.overlays.contains(&overlay)
    }

    /// Compares the raw button values with the previous call and returns the
    /// command phases the simulator would dispatch
    ///
    /// A command begun on press is ended on release even if the assignment
    /// changed while the button was held.
    pub fn dispatch_buttons(&mut self) -> Vec<(CommandRef, CommandPhase)> {
        let values = self
            .int_arrays
            .get(datarefs::JOYSTICK_BUTTON_VALUES)
            .cloned()
            .unwrap_or_default();

        let mut dispatched = Vec::new();
        for (index, value) in values.iter().enumerate() {
            let down = *value != 0;
            match (down, self.pressed.get(&index).copied()) {
                (true, None) => {
                    if let Some(command) = self.assignment(index) {
                        self.pressed.insert(index, command);
                        dispatched.push((command, CommandPhase::Begin));
                    }
                }
                (true, Some(command)) => dispatched.push((command, CommandPhase::Continue)),
                (false, Some(command)) => {
                    self.pressed.remove(&index);
                    dispatched.push((command, CommandPhase::End));
                }
                (false, None) => {}
            }
        }
        dispatched
    }
}

impl Host for MemoryHost {
    fn get_f32(&self, path: &str) -> Option<f32> {
        self.floats.get(path).copied()
    }

    fn set_f32(&mut self, path: &str, value: f32) {
        match self.floats.get_mut(path) {
            Some(slot) => *slot = value,
            None => debug!("Dropping write to unknown float dataref {}", path),
        }
    }

    fn get_i32(&self, path: &str) -> Option<i32> {
        self.ints.get(path).copied()
    }

    fn set_i32(&mut self, path: &str, value: i32) {
        match self.ints.get_mut(path) {
            Some(slot) => *slot = value,
            None => debug!("Dropping write to unknown int dataref {}", path),
        }
    }

    fn get_f32_array(&self, path: &str, out: &mut [f32]) -> usize {
        match self.float_arrays.get(path) {
            Some(values) => {
                let count = values.len().min(out.len());
                out[..count].copy_from_slice(&values[..count]);
                count
            }
            None => 0,
        }
    }

    fn set_f32_array(&mut self, path: &str, values: &[f32]) {
        if let Some(slots) = self.float_arrays.get_mut(path) {
            let count = values.len().min(slots.len());
            slots[..count].copy_from_slice(&values[..count]);
        }
    }

    fn get_i32_array(&self, path: &str, out: &mut [i32]) -> usize {
        match self.int_arrays.get(path) {
            Some(values) => {
                let count = values.len().min(out.len());
                out[..count].copy_from_slice(&values[..count]);
                count
            }
            None => 0,
        }
    }

    fn set_i32_array(&mut self, path: &str, values: &[i32]) {
        if let Some(slots) = self.int_arrays.get_mut(path) {
            let count = values.len().min(slots.len());
            slots[..count].copy_from_slice(&values[..count]);
        }
    }

    fn read_button_assignments(&self, out: &mut [AssignmentSlot]) {
        let count = out.len().min(self.button_assignments.len());
        out[..count].copy_from_slice(&self.button_assignments[..count]);
    }

    fn write_button_assignments(&mut self, offset: usize, values: &[AssignmentSlot]) {
        if offset >= self.button_assignments.len() {
            warn!("Assignment write at {} is outside the table", offset);
            return;
        }
        let count = values.len().min(self.button_assignments.len() - offset);
        self.button_assignments[offset..offset + count].copy_from_slice(&values[..count]);
    }

    fn find_command(&self, name: &str) -> Option<CommandRef> {
        self.commands.get(name).copied()
    }

    fn create_command(&mut self, name: &str, _description: &str) -> CommandRef {
        self.define_command(name)
    }

    fn register_command_handler(&mut self, command: CommandRef) {
        self.handlers.insert(command);
    }

    fn unregister_command_handler(&mut self, command: CommandRef) {
        self.handlers.remove(&command);
    }

    fn command_once(&mut self, command: CommandRef) {
        self.once_log.push(command);
    }

    fn command_begin(&mut self, command: CommandRef) {
        self.held.insert(command);
    }

    fn command_end(&mut self, command: CommandRef) {
        self.held.remove(&command);
    }

    fn is_plugin_enabled(&self, signature: &str) -> bool {
        self.plugins.contains(signature)
    }

    fn set_overlay_visible(&mut self, overlay: Overlay, visible: bool) {
        if visible {
            self.overlays.insert(overlay);
        } else {
            self.overlays.remove(&overlay);
        }
    }
}

/// Synthetic input event captured by [`RecordingInjector`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectedEvent {
    Move { dx: i32, dy: i32 },
    Button { button: MouseButton, down: bool },
    Scroll { clicks: i32 },
    Key { code: u32, down: bool },
}

/// Injector that records events instead of talking to the OS
#[derive(Debug, Default)]
pub struct RecordingInjector {
    events: Mutex<Vec<InjectedEvent>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<InjectedEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn record(&self, event: InjectedEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl InputInjector for RecordingInjector {
    fn move_pointer(&self, dx: i32, dy: i32) {
        self.record(InjectedEvent::Move { dx, dy });
    }

    fn mouse_button(&self, button: MouseButton, down: bool) {
        self.record(InjectedEvent::Button { button, down });
    }

    fn scroll(&self, clicks: i32) {
        self.record(InjectedEvent::Scroll { clicks });
    }

    fn key(&self, code: u32, down: bool) {
        self.record(InjectedEvent::Key { code, down });
    }
}
