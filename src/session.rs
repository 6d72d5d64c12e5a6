//! Session context
//!
//! Owns every piece of mutable plugin state and is passed by reference into
//! each host callback. All methods run on the host's frame/command thread;
//! only the touchpad feed lives on its own thread and talks to the OS
//! through the shared injector.

use crate::commands::{CommandTable, CustomCommand};
use crate::config::Settings;
use crate::controller::calibration::{
    CalibrationSequencer, CalibrationState, CalibrationStep, CalibrationTarget,
};
use crate::controller::profile::{AxisRole, ButtonRole, IndexMapper};
use crate::controller::touchpad::{HidTouchpad, TouchpadError, TouchpadFeed};
use crate::host::datarefs::{self, commands};
use crate::host::{
    CommandPhase, CommandRef, Host, InputInjector, MouseButton, Overlay, PluginMessage,
    AXIS_COUNT, BUTTON_COUNT,
};
use crate::mapping::engine::{AxisEngine, FrameInput};
use crate::mapping::keyboard::{Direction, OnScreenKeyboard};
use crate::mapping::long_press::{LongPress, PressOutcome};
use crate::mapping::modes::{Mode, ModeMachine};
use crate::mapping::response::SPEEDBRAKE_ARMED;
use crate::mapping::trim;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Host value for "no axis function"
pub const AXIS_NONE: i32 = 0;
pub const AXIS_PITCH: i32 = 1;
pub const AXIS_ROLL: i32 = 2;
pub const AXIS_YAW: i32 = 3;

/// Head angles within this many degrees of centre snap back on view exit
pub const RECENTER_TOLERANCE: f32 = 10.0;

const DEFAULT_NULLZONE: f32 = 0.1;

/// What a button does after "apply defaults"
#[derive(Debug, Clone, Copy)]
enum Binding {
    Custom(CustomCommand),
    Sim(&'static str),
}

const DEFAULT_BUTTONS: [(ButtonRole, Binding); 14] = [
    (ButtonRole::BumperLeft, Binding::Custom(CustomCommand::ViewModifier)),
    (ButtonRole::BumperRight, Binding::Custom(CustomCommand::TrimModifier)),
    (ButtonRole::FaceDown, Binding::Custom(CustomCommand::PropModifier)),
    (ButtonRole::FaceRight, Binding::Custom(CustomCommand::MixtureModifier)),
    (ButtonRole::FaceLeft, Binding::Custom(CustomCommand::CowlModifier)),
    (ButtonRole::FaceUp, Binding::Custom(CustomCommand::SpeedbrakeOrCarbHeat)),
    (ButtonRole::CenterLeft, Binding::Custom(CustomCommand::MouseOrKeyboard)),
    (ButtonRole::CenterRight, Binding::Custom(CustomCommand::AutopilotOrFlightDirector)),
    (ButtonRole::StickLeft, Binding::Custom(CustomCommand::SwitchView)),
    (ButtonRole::StickRight, Binding::Custom(CustomCommand::BetaOrReverse)),
    (ButtonRole::DpadUp, Binding::Sim(commands::FLAPS_UP)),
    (ButtonRole::DpadDown, Binding::Sim(commands::FLAPS_DOWN)),
    (ButtonRole::DpadLeft, Binding::Sim(commands::GEAR_TOGGLE)),
    (ButtonRole::DpadRight, Binding::Sim(commands::PARKING_BRAKE_TOGGLE)),
];

const DEFAULT_AXES: [(AxisRole, i32); 6] = [
    (AxisRole::RightX, AXIS_ROLL),
    (AxisRole::RightY, AXIS_PITCH),
    (AxisRole::LeftX, AXIS_YAW),
    (AxisRole::LeftY, AXIS_NONE),
    (AxisRole::LeftTrigger, AXIS_NONE),
    (AxisRole::RightTrigger, AXIS_NONE),
];

/// Camera settings taken over while in view mode
#[derive(Debug, Clone, Copy)]
struct CameraOverride {
    cinema_verite: i32,
    head_shake: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeadPosition {
    x: f32,
    y: f32,
    z: f32,
}

pub struct Session {
    settings: Settings,
    settings_path: Option<PathBuf>,
    mapper: IndexMapper,
    machine: ModeMachine,
    engine: AxisEngine,
    calibration: CalibrationSequencer,
    commands: CommandTable,
    keyboard: OnScreenKeyboard,
    injector: Arc<dyn InputInjector>,
    touchpad: Option<TouchpadFeed>,
    presses: HashMap<CustomCommand, LongPress>,
    camera: Option<CameraOverride>,
    head_home: Option<HeadPosition>,
    force_trim: Option<CommandRef>,
    mouse_held: HashSet<MouseButton>,
    view_reset_pending: bool,
}

impl Session {
    pub fn new(
        settings: Settings,
        settings_path: Option<PathBuf>,
        injector: Arc<dyn InputInjector>,
    ) -> Self {
        let mapper = IndexMapper::new(settings.controller_type, settings.offsets());
        info!(
            "Session for {} with offsets {:?}",
            mapper.profile().name,
            mapper.offsets()
        );
        Self {
            settings,
            settings_path,
            mapper,
            machine: ModeMachine::new(),
            engine: AxisEngine::new(),
            calibration: CalibrationSequencer::new(),
            commands: CommandTable::default(),
            keyboard: OnScreenKeyboard::qwerty(),
            injector,
            touchpad: None,
            presses: HashMap::new(),
            camera: None,
            head_home: None,
            force_trim: None,
            mouse_held: HashSet::new(),
            view_reset_pending: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mapper(&self) -> &IndexMapper {
        &self.mapper
    }

    pub fn mode(&self) -> Mode {
        self.machine.current()
    }

    pub fn stack_depth(&self) -> usize {
        self.machine.stack_depth()
    }

    pub fn keyboard(&self) -> &OnScreenKeyboard {
        &self.keyboard
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    pub fn calibration_status(&self) -> String {
        self.calibration.status()
    }

    pub fn command_handle(&self, command: CustomCommand) -> Option<CommandRef> {
        self.commands.handle(command)
    }

    /// Registers the custom commands
    pub fn start(&mut self, host: &mut dyn Host) {
        self.commands = CommandTable::register(host);
    }

    /// Forced return to rest, then removes the custom commands
    pub fn stop(&mut self, host: &mut dyn Host) {
        self.force_rest(host);
        self.commands.unregister(host);
        if let Some(mut feed) = self.touchpad.take() {
            feed.stop();
        }
        info!("Session stopped");
    }

    /// Performs every release an end phase would, whatever mode is active
    pub fn force_rest(&mut self, host: &mut dyn Host) {
        self.release_camera(host);
        self.end_force_trim(host);
        self.release_mouse_buttons();
        self.keyboard.release_all(self.injector.as_ref());
        host.set_overlay_visible(Overlay::Mouse, false);
        host.set_overlay_visible(Overlay::Keyboard, false);
        self.machine.force_rest(host);
        self.presses.clear();
        if self.calibration.is_collecting() {
            self.calibration.abort();
        }
    }

    /// Looks for a DualShock 4 and starts the touchpad feed
    pub fn detect_touchpad(&mut self) -> Result<(), TouchpadError> {
        if self.touchpad_active() {
            return Ok(());
        }
        let source = HidTouchpad::open()?;
        self.attach_touchpad(TouchpadFeed::spawn(source, self.injector.clone())?);
        Ok(())
    }

    pub fn attach_touchpad(&mut self, feed: TouchpadFeed) {
        if let Some(mut old) = self.touchpad.replace(feed) {
            old.stop();
        }
    }

    pub fn touchpad_active(&self) -> bool {
        self.touchpad.as_ref().is_some_and(|feed| feed.is_running())
    }

    // ---- frame ----

    /// Per-frame work; returns the host's "call again next frame" value
    pub fn frame(&mut self, host: &mut dyn Host, elapsed: f32) -> f32 {
        if self.view_reset_pending {
            self.view_reset_pending = false;
            host.command_once_named(commands::VIEW_3D_COCKPIT);
        }

        if let Some(feed) = &self.touchpad {
            if !feed.is_running() {
                warn!("Touchpad feed ended");
                self.touchpad = None;
            }
        }

        if self.calibration.is_collecting() {
            self.calibration_frame(host);
            return -1.0;
        }

        let nullzone = self
            .settings
            .nullzone
            .or_else(|| host.get_f32(datarefs::JOYSTICK_PITCH_NULLZONE))
            .unwrap_or(DEFAULT_NULLZONE);
        let input = FrameInput {
            mapper: &self.mapper,
            injector: self.injector.as_ref(),
            nullzone,
            dt: elapsed,
        };
        self.engine.update(host, &mut self.machine, &input);
        -1.0
    }

    fn calibration_frame(&mut self, host: &mut dyn Host) {
        let mut axes = [0.5; AXIS_COUNT];
        let read = host.get_f32_array(datarefs::JOYSTICK_AXIS_VALUES, &mut axes);
        let centred: Vec<f32> = axes[..read].iter().map(|v| v * 2.0 - 1.0).collect();

        let mut raw_buttons = vec![0; BUTTON_COUNT];
        let read = host.get_i32_array(datarefs::JOYSTICK_BUTTON_VALUES, &mut raw_buttons);
        let buttons: Vec<f32> = raw_buttons[..read].iter().map(|b| *b as f32).collect();

        match self.calibration.update(&centred, &buttons) {
            CalibrationStep::Waiting | CalibrationStep::AxisFound(_) => {}
            CalibrationStep::Complete(offsets) => {
                self.settings.set_offsets(offsets);
                self.mapper = IndexMapper::new(self.settings.controller_type, offsets);
                self.engine.reset();
                self.apply_default_assignments(host);
                self.save_settings();
            }
        }
    }

    // ---- calibration ----

    /// Drops any active mode first; its End never arrives while collecting
    pub fn start_calibration(&mut self, host: &mut dyn Host) -> bool {
        match CalibrationTarget::for_profile(self.mapper.profile()) {
            Some(target) => {
                if self.calibration.state() == CalibrationState::Start {
                    self.force_rest(host);
                }
                self.calibration.start(target)
            }
            None => {
                warn!("Profile {} cannot be calibrated", self.mapper.profile().name);
                false
            }
        }
    }

    pub fn abort_calibration(&mut self) {
        self.calibration.abort();
    }

    pub fn acknowledge_calibration(&mut self) {
        self.calibration.acknowledge();
    }

    // ---- settings ----

    /// Replaces the settings, e.g. after the controller family was changed
    pub fn apply_settings(&mut self, host: &mut dyn Host, settings: Settings) {
        self.force_rest(host);
        self.mapper = IndexMapper::new(settings.controller_type, settings.offsets());
        self.settings = settings;
        self.engine.reset();
        self.save_settings();
    }

    /// Called when the indicator window was dragged to a new position
    pub fn set_indicator_position(&mut self, x: i32, y: i32) {
        if (self.settings.indicator_x, self.settings.indicator_y) == (x, y) {
            return;
        }
        self.settings.indicator_x = x;
        self.settings.indicator_y = y;
        self.save_settings();
    }

    pub fn save_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(e) = self.settings.save(path) {
            error!("Could not save settings: {}", e);
        }
    }

    /// Writes the default button and axis assignments for the active profile
    pub fn apply_default_assignments(&mut self, host: &mut dyn Host) {
        if self.machine.current() != Mode::Default || self.machine.stack_depth() > 0 {
            self.force_rest(host);
        }

        for (role, binding) in DEFAULT_BUTTONS {
            let command = match binding {
                Binding::Custom(custom) => self.commands.handle(custom),
                Binding::Sim(name) => host.find_command(name),
            };
            if command.is_none() {
                debug!("No command for {:?}", role);
            }
            self.bind(host, role, command);
        }
        for (role, function) in DEFAULT_AXES {
            self.set_axis_function(host, role, function);
        }
        info!("Default assignments applied for {}", self.mapper.profile().name);
    }

    // ---- messages ----

    pub fn receive_message(&mut self, message: PluginMessage) {
        match message {
            PluginMessage::AircraftLoaded | PluginMessage::AirportLoaded => {
                debug!("{:?}: resetting head position", message);
                self.head_home = None;
                self.view_reset_pending = true;
            }
        }
    }

    // ---- commands ----

    /// Dispatches one phase of a host command; false if it is not ours
    pub fn handle_command(
        &mut self,
        host: &mut dyn Host,
        handle: CommandRef,
        phase: CommandPhase,
    ) -> bool {
        let Some(command) = self.commands.lookup(handle) else {
            return false;
        };

        if self.calibration.is_collecting()
            && !matches!(command, CustomCommand::Calibrate | CustomCommand::CalibrateAbort)
        {
            return true;
        }

        match (command, phase) {
            (CustomCommand::ViewModifier, CommandPhase::Begin) => self.enter_view(host),
            (CustomCommand::ViewModifier, CommandPhase::End) => self.exit_view(host),

            (CustomCommand::SwitchView, CommandPhase::Begin) => self.switch_view(host),
            (CustomCommand::SwitchView, CommandPhase::End) => self.leave(host, Mode::SwitchView),

            (CustomCommand::PropModifier, CommandPhase::Begin) => {
                self.enter(host, Mode::PropOrThrottle);
            }
            (CustomCommand::PropModifier, CommandPhase::End) => {
                self.leave(host, Mode::PropOrThrottle)
            }
            (CustomCommand::MixtureModifier, CommandPhase::Begin) => {
                self.enter(host, Mode::Mixture);
            }
            (CustomCommand::MixtureModifier, CommandPhase::End) => self.leave(host, Mode::Mixture),
            (CustomCommand::CowlModifier, CommandPhase::Begin) => {
                self.enter(host, Mode::Cowl);
            }
            (CustomCommand::CowlModifier, CommandPhase::End) => self.leave(host, Mode::Cowl),

            (CustomCommand::TrimModifier, CommandPhase::Begin) => self.enter_trim(host),
            (CustomCommand::TrimModifier, CommandPhase::End) => self.exit_trim(host),

            (CustomCommand::MouseOrKeyboard, phase) => self.mouse_or_keyboard(host, phase),

            (CustomCommand::SpeedbrakeOrCarbHeat, phase) => {
                let outcome = self.long_press(host, command, phase);
                self.speedbrake_or_carb_heat(host, outcome);
            }
            (CustomCommand::AutopilotOrFlightDirector, phase) => {
                let outcome = self.long_press(host, command, phase);
                run_short_or_long(
                    host,
                    outcome,
                    commands::AUTOPILOT_SERVOS_TOGGLE,
                    commands::FLIGHT_DIRECTOR_OFF,
                );
            }
            (CustomCommand::BetaOrReverse, phase) => {
                let outcome = self.long_press(host, command, phase);
                run_short_or_long(
                    host,
                    outcome,
                    commands::BETA_TOGGLE,
                    commands::THRUST_REVERSE_TOGGLE,
                );
            }

            (CustomCommand::MouseLeft, phase) => self.mouse_button(MouseButton::Left, phase),
            (CustomCommand::MouseRight, phase) => self.mouse_button(MouseButton::Right, phase),
            (CustomCommand::ScrollUp, CommandPhase::Begin) => self.injector.scroll(1),
            (CustomCommand::ScrollDown, CommandPhase::Begin) => self.injector.scroll(-1),

            (CustomCommand::KeyboardUp, CommandPhase::Begin) => self.move_key(Direction::Up),
            (CustomCommand::KeyboardDown, CommandPhase::Begin) => self.move_key(Direction::Down),
            (CustomCommand::KeyboardLeft, CommandPhase::Begin) => self.move_key(Direction::Left),
            (CustomCommand::KeyboardRight, CommandPhase::Begin) => {
                self.move_key(Direction::Right)
            }
            (CustomCommand::KeyboardPress, CommandPhase::Begin) => {
                self.keyboard.press(self.injector.as_ref(), true)
            }
            (CustomCommand::KeyboardPress, CommandPhase::End) => {
                self.keyboard.press(self.injector.as_ref(), false)
            }
            (CustomCommand::KeyboardLock, CommandPhase::Begin) => {
                self.keyboard.toggle_lock(self.injector.as_ref())
            }

            (CustomCommand::Calibrate, CommandPhase::Begin) => {
                self.start_calibration(host);
            }
            (CustomCommand::CalibrateAbort, CommandPhase::Begin) => {
                if self.calibration.is_collecting() {
                    self.calibration.abort();
                } else {
                    self.calibration.acknowledge();
                }
            }
            (CustomCommand::ApplyDefaults, CommandPhase::Begin) => {
                self.apply_default_assignments(host)
            }

            _ => {}
        }
        true
    }

    fn enter(&mut self, host: &mut dyn Host, mode: Mode) -> bool {
        match self.machine.try_enter(host, mode) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn leave(&mut self, host: &mut dyn Host, mode: Mode) {
        if let Err(e) = self.machine.exit(host, mode) {
            debug!("{}", e);
        }
    }

    fn long_press(
        &mut self,
        host: &dyn Host,
        command: CustomCommand,
        phase: CommandPhase,
    ) -> PressOutcome {
        let now = host.running_time();
        self.presses.entry(command).or_default().phase(phase, now)
    }

    // ---- view ----

    fn enter_view(&mut self, host: &mut dyn Host) {
        if !self.enter(host, Mode::View) {
            return;
        }
        self.unassign_left_stick(host);
        self.bind_sim(host, ButtonRole::DpadUp, commands::HEAD_FORWARD);
        self.bind_sim(host, ButtonRole::DpadDown, commands::HEAD_BACKWARD);
        self.bind_sim(host, ButtonRole::DpadLeft, commands::PAN_LEFT);
        self.bind_sim(host, ButtonRole::DpadRight, commands::PAN_RIGHT);
        self.take_camera(host);

        if self.head_home.is_none() {
            self.head_home = read_head_position(host);
        }
    }

    fn exit_view(&mut self, host: &mut dyn Host) {
        if !self.machine.is(Mode::View) {
            return;
        }
        self.release_camera(host);
        self.recenter_head(host);
        self.leave(host, Mode::View);
    }

    fn take_camera(&mut self, host: &mut dyn Host) {
        if self.camera.is_some() {
            return;
        }
        self.camera = Some(CameraOverride {
            cinema_verite: host.get_i32(datarefs::CINEMA_VERITE).unwrap_or(0),
            head_shake: host.get_i32(datarefs::HEAD_SHAKE_OVERRIDE).unwrap_or(0),
        });
        host.set_i32(datarefs::CINEMA_VERITE, 0);
        host.set_i32(datarefs::HEAD_SHAKE_OVERRIDE, 1);
    }

    fn release_camera(&mut self, host: &mut dyn Host) {
        if let Some(camera) = self.camera.take() {
            host.set_i32(datarefs::CINEMA_VERITE, camera.cinema_verite);
            host.set_i32(datarefs::HEAD_SHAKE_OVERRIDE, camera.head_shake);
        }
    }

    fn recenter_head(&mut self, host: &mut dyn Host) {
        let psi = host.get_f32(datarefs::PILOTS_HEAD_PSI).unwrap_or(0.0);
        let the = host.get_f32(datarefs::PILOTS_HEAD_THE).unwrap_or(0.0);
        if psi.abs() > RECENTER_TOLERANCE || the.abs() > RECENTER_TOLERANCE {
            return;
        }
        host.set_f32(datarefs::PILOTS_HEAD_PSI, 0.0);
        host.set_f32(datarefs::PILOTS_HEAD_THE, 0.0);
        if let Some(home) = self.head_home {
            host.set_f32(datarefs::PILOTS_HEAD_X, home.x);
            host.set_f32(datarefs::PILOTS_HEAD_Y, home.y);
            host.set_f32(datarefs::PILOTS_HEAD_Z, home.z);
        }
        debug!("Head recentred");
    }

    fn switch_view(&mut self, host: &mut dyn Host) {
        let next = match host.get_i32(datarefs::VIEW_TYPE) {
            Some(datarefs::VIEW_TYPE_3D_COCKPIT) => commands::VIEW_FORWARD_NOTHING,
            Some(datarefs::VIEW_TYPE_FORWARD_NOTHING) => commands::VIEW_CHASE,
            _ => commands::VIEW_3D_COCKPIT,
        };
        host.command_once_named(next);

        if self.machine.is(Mode::Default) && self.enter(host, Mode::SwitchView) {
            self.bind_sim(host, ButtonRole::DpadUp, commands::VIEW_3D_COCKPIT);
            self.bind_sim(host, ButtonRole::DpadLeft, commands::VIEW_FORWARD_NOTHING);
            self.bind_sim(host, ButtonRole::DpadDown, commands::VIEW_CHASE);
            self.bind_sim(host, ButtonRole::DpadRight, commands::VIEW_FREE_CAMERA);
        }
    }

    // ---- trim ----

    fn enter_trim(&mut self, host: &mut dyn Host) {
        if !self.enter(host, Mode::Trim) {
            return;
        }
        trim::bind_trim(host, &self.mapper);
        self.force_trim = trim::begin_force_trim(host);
    }

    fn exit_trim(&mut self, host: &mut dyn Host) {
        if !self.machine.is(Mode::Trim) {
            return;
        }
        self.end_force_trim(host);
        self.leave(host, Mode::Trim);
    }

    fn end_force_trim(&mut self, host: &mut dyn Host) {
        if let Some(command) = self.force_trim.take() {
            host.command_end(command);
        }
    }

    // ---- mouse / keyboard ----

    fn mouse_or_keyboard(&mut self, host: &mut dyn Host, phase: CommandPhase) {
        if self.touchpad_active() {
            if phase == CommandPhase::Begin {
                if self.machine.is(Mode::Keyboard) {
                    self.exit_keyboard(host);
                } else {
                    self.enter_keyboard(host);
                }
            }
            return;
        }

        if phase == CommandPhase::Begin {
            match self.machine.current() {
                Mode::Mouse => return self.exit_mouse(host),
                Mode::Keyboard => return self.exit_keyboard(host),
                _ => {}
            }
        }

        match self.long_press(host, CustomCommand::MouseOrKeyboard, phase) {
            PressOutcome::Short => self.enter_mouse(host),
            PressOutcome::Long => self.enter_keyboard(host),
            PressOutcome::Pending => {}
        }
    }

    fn enter_mouse(&mut self, host: &mut dyn Host) {
        if !self.enter(host, Mode::Mouse) {
            return;
        }
        self.unassign_left_stick(host);
        self.bind_custom(host, ButtonRole::FaceDown, CustomCommand::MouseLeft);
        self.bind_custom(host, ButtonRole::FaceRight, CustomCommand::MouseRight);
        self.bind_custom(host, ButtonRole::DpadUp, CustomCommand::ScrollUp);
        self.bind_custom(host, ButtonRole::DpadDown, CustomCommand::ScrollDown);
        if self.settings.show_indicator {
            host.set_overlay_visible(Overlay::Mouse, true);
        }
    }

    fn exit_mouse(&mut self, host: &mut dyn Host) {
        self.release_mouse_buttons();
        self.leave(host, Mode::Mouse);
        host.set_overlay_visible(Overlay::Mouse, false);
    }

    fn enter_keyboard(&mut self, host: &mut dyn Host) {
        if !self.enter(host, Mode::Keyboard) {
            return;
        }
        self.bind_custom(host, ButtonRole::DpadUp, CustomCommand::KeyboardUp);
        self.bind_custom(host, ButtonRole::DpadDown, CustomCommand::KeyboardDown);
        self.bind_custom(host, ButtonRole::DpadLeft, CustomCommand::KeyboardLeft);
        self.bind_custom(host, ButtonRole::DpadRight, CustomCommand::KeyboardRight);
        self.bind_custom(host, ButtonRole::FaceDown, CustomCommand::KeyboardPress);
        self.bind_custom(host, ButtonRole::FaceLeft, CustomCommand::KeyboardLock);
        host.set_overlay_visible(Overlay::Keyboard, true);
    }

    fn exit_keyboard(&mut self, host: &mut dyn Host) {
        self.keyboard.release_all(self.injector.as_ref());
        self.leave(host, Mode::Keyboard);
        host.set_overlay_visible(Overlay::Keyboard, false);
    }

    fn mouse_button(&mut self, button: MouseButton, phase: CommandPhase) {
        match phase {
            CommandPhase::Begin => {
                self.injector.mouse_button(button, true);
                self.mouse_held.insert(button);
            }
            CommandPhase::End => {
                if self.mouse_held.remove(&button) {
                    self.injector.mouse_button(button, false);
                }
            }
            CommandPhase::Continue => {}
        }
    }

    fn release_mouse_buttons(&mut self) {
        for button in self.mouse_held.drain() {
            self.injector.mouse_button(button, false);
        }
    }

    fn move_key(&mut self, direction: Direction) {
        if self.machine.is(Mode::Keyboard) {
            self.keyboard.move_selection(direction);
        }
    }

    // ---- discrete actions ----

    fn speedbrake_or_carb_heat(&mut self, host: &mut dyn Host, outcome: PressOutcome) {
        let has_speedbrake = host.get_i32(datarefs::HAS_SPEEDBRAKE).unwrap_or(0) != 0;
        match (outcome, has_speedbrake) {
            (PressOutcome::Short, true) => {
                let ratio = host.get_f32(datarefs::SPEEDBRAKE_RATIO).unwrap_or(0.0);
                let target = if ratio > 0.0 { 0.0 } else { 1.0 };
                host.set_f32(datarefs::SPEEDBRAKE_RATIO, target);
            }
            (PressOutcome::Short, false) => {
                host.command_once_named(commands::CARB_HEAT_TOGGLE);
            }
            (PressOutcome::Long, true) => {
                host.set_f32(datarefs::SPEEDBRAKE_RATIO, SPEEDBRAKE_ARMED);
                info!("Speedbrake armed");
            }
            (PressOutcome::Long, false) => debug!("No speedbrake to arm"),
            (PressOutcome::Pending, _) => {}
        }
    }

    // ---- assignment helpers ----

    fn bind(&self, host: &mut dyn Host, role: ButtonRole, command: Option<CommandRef>) {
        if let Some(slot) = self.mapper.button(role) {
            host.write_button_assignments(slot, &[command]);
        }
    }

    fn bind_sim(&self, host: &mut dyn Host, role: ButtonRole, name: &str) {
        let command = host.find_command(name);
        if command.is_none() {
            debug!("Command {} not available, {:?} left unbound", name, role);
        }
        self.bind(host, role, command);
    }

    fn bind_custom(&self, host: &mut dyn Host, role: ButtonRole, command: CustomCommand) {
        self.bind(host, role, self.commands.handle(command));
    }

    fn set_axis_function(&self, host: &mut dyn Host, role: AxisRole, function: i32) {
        let Some(index) = self.mapper.axis(role) else {
            return;
        };
        let mut table = [AXIS_NONE; AXIS_COUNT];
        let len = host.get_i32_array(datarefs::JOYSTICK_AXIS_ASSIGNMENTS, &mut table);
        if index < len {
            table[index] = function;
            host.set_i32_array(datarefs::JOYSTICK_AXIS_ASSIGNMENTS, &table[..len]);
        }
    }

    fn unassign_left_stick(&self, host: &mut dyn Host) {
        self.set_axis_function(host, AxisRole::LeftX, AXIS_NONE);
        self.set_axis_function(host, AxisRole::LeftY, AXIS_NONE);
    }
}

fn read_head_position(host: &dyn Host) -> Option<HeadPosition> {
    Some(HeadPosition {
        x: host.get_f32(datarefs::PILOTS_HEAD_X)?,
        y: host.get_f32(datarefs::PILOTS_HEAD_Y)?,
        z: host.get_f32(datarefs::PILOTS_HEAD_Z)?,
    })
}

fn run_short_or_long(host: &mut dyn Host, outcome: PressOutcome, short: &str, long: &str) {
    match outcome {
        PressOutcome::Short => {
            host.command_once_named(short);
        }
        PressOutcome::Long => {
            host.command_once_named(long);
        }
        PressOutcome::Pending => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::touchpad::TouchpadSource;
    use crate::host::{MemoryHost, RecordingInjector};
    use std::time::Duration;

    fn session() -> (Session, MemoryHost) {
        let mut host = MemoryHost::with_default_aircraft();
        let mut session = Session::new(
            Settings::default(),
            None,
            Arc::new(RecordingInjector::new()),
        );
        session.start(&mut host);
        (session, host)
    }

    /// Never delivers a report, keeps the feed thread alive until stopped
    struct IdleTouchpad;

    impl TouchpadSource for IdleTouchpad {
        fn read_report(&mut self, _buf: &mut [u8], timeout_ms: i32) -> Result<usize, TouchpadError> {
            std::thread::sleep(Duration::from_millis(timeout_ms.clamp(1, 5) as u64));
            Ok(0)
        }
    }

    fn press(session: &mut Session, host: &mut MemoryHost, command: CustomCommand, phase: CommandPhase) {
        let handle = session.command_handle(command).unwrap();
        assert!(session.handle_command(host, handle, phase));
    }

    #[test]
    fn test_unknown_command_is_not_handled() {
        let (mut session, mut host) = session();
        let gear = host.find_command(commands::GEAR_TOGGLE).unwrap();
        assert!(!session.handle_command(&mut host, gear, CommandPhase::Begin));
    }

    #[test]
    fn test_view_takes_and_returns_camera() {
        let (mut session, mut host) = session();
        host.insert_i32(datarefs::CINEMA_VERITE, 1);

        press(&mut session, &mut host, CustomCommand::ViewModifier, CommandPhase::Begin);
        assert_eq!(session.mode(), Mode::View);
        assert_eq!(host.get_i32(datarefs::CINEMA_VERITE), Some(0));
        assert_eq!(host.get_i32(datarefs::HEAD_SHAKE_OVERRIDE), Some(1));

        press(&mut session, &mut host, CustomCommand::ViewModifier, CommandPhase::End);
        assert_eq!(session.mode(), Mode::Default);
        assert_eq!(host.get_i32(datarefs::CINEMA_VERITE), Some(1));
        assert_eq!(host.get_i32(datarefs::HEAD_SHAKE_OVERRIDE), Some(0));
    }

    #[test]
    fn test_view_exit_recentres_only_near_centre() {
        let (mut session, mut host) = session();
        host.insert_f32(datarefs::PILOTS_HEAD_Z, 0.4);

        press(&mut session, &mut host, CustomCommand::ViewModifier, CommandPhase::Begin);
        host.insert_f32(datarefs::PILOTS_HEAD_PSI, 8.0);
        host.insert_f32(datarefs::PILOTS_HEAD_Z, 0.1);
        press(&mut session, &mut host, CustomCommand::ViewModifier, CommandPhase::End);
        assert_eq!(host.get_f32(datarefs::PILOTS_HEAD_PSI), Some(0.0));
        assert_eq!(host.get_f32(datarefs::PILOTS_HEAD_Z), Some(0.4));

        press(&mut session, &mut host, CustomCommand::ViewModifier, CommandPhase::Begin);
        host.insert_f32(datarefs::PILOTS_HEAD_PSI, 45.0);
        press(&mut session, &mut host, CustomCommand::ViewModifier, CommandPhase::End);
        assert_eq!(host.get_f32(datarefs::PILOTS_HEAD_PSI), Some(45.0));
    }

    #[test]
    fn test_switch_view_cycles_and_binds_only_from_default() {
        let (mut session, mut host) = session();
        press(&mut session, &mut host, CustomCommand::SwitchView, CommandPhase::Begin);
        assert_eq!(host.once_count(commands::VIEW_FORWARD_NOTHING), 1);
        assert_eq!(session.mode(), Mode::SwitchView);
        let up = session.mapper().button(ButtonRole::DpadUp).unwrap();
        assert_eq!(host.assignment(up), host.find_command(commands::VIEW_3D_COCKPIT));

        press(&mut session, &mut host, CustomCommand::SwitchView, CommandPhase::End);
        assert_eq!(session.mode(), Mode::Default);
        assert_eq!(host.assignment(up), None);

        press(&mut session, &mut host, CustomCommand::MixtureModifier, CommandPhase::Begin);
        press(&mut session, &mut host, CustomCommand::SwitchView, CommandPhase::Begin);
        assert_eq!(host.once_count(commands::VIEW_FORWARD_NOTHING), 2);
        assert_eq!(session.mode(), Mode::Mixture);
    }

    #[test]
    fn test_trim_holds_force_trim_for_helicopters() {
        let (mut session, mut host) = session();
        host.insert_i32(datarefs::IS_HELICOPTER, 1);

        press(&mut session, &mut host, CustomCommand::TrimModifier, CommandPhase::Begin);
        assert!(host.is_held(commands::FORCE_TRIM));
        press(&mut session, &mut host, CustomCommand::TrimModifier, CommandPhase::End);
        assert!(!host.is_held(commands::FORCE_TRIM));
        assert_eq!(session.stack_depth(), 0);
    }

    #[test]
    fn test_speedbrake_short_toggles_long_arms() {
        let (mut session, mut host) = session();
        host.insert_i32(datarefs::HAS_SPEEDBRAKE, 1);

        press(&mut session, &mut host, CustomCommand::SpeedbrakeOrCarbHeat, CommandPhase::Begin);
        press(&mut session, &mut host, CustomCommand::SpeedbrakeOrCarbHeat, CommandPhase::End);
        assert_eq!(host.get_f32(datarefs::SPEEDBRAKE_RATIO), Some(1.0));

        press(&mut session, &mut host, CustomCommand::SpeedbrakeOrCarbHeat, CommandPhase::Begin);
        host.advance_time(1.5);
        press(&mut session, &mut host, CustomCommand::SpeedbrakeOrCarbHeat, CommandPhase::Continue);
        press(&mut session, &mut host, CustomCommand::SpeedbrakeOrCarbHeat, CommandPhase::End);
        assert_eq!(host.get_f32(datarefs::SPEEDBRAKE_RATIO), Some(SPEEDBRAKE_ARMED));
    }

    #[test]
    fn test_carb_heat_without_speedbrake() {
        let (mut session, mut host) = session();
        press(&mut session, &mut host, CustomCommand::SpeedbrakeOrCarbHeat, CommandPhase::Begin);
        press(&mut session, &mut host, CustomCommand::SpeedbrakeOrCarbHeat, CommandPhase::End);
        assert_eq!(host.once_count(commands::CARB_HEAT_TOGGLE), 1);
    }

    #[test]
    fn test_apply_defaults_binds_profile_slots() {
        let (mut session, mut host) = session();
        press(&mut session, &mut host, CustomCommand::ApplyDefaults, CommandPhase::Begin);

        let bumper = session.mapper().button(ButtonRole::BumperLeft).unwrap();
        assert_eq!(host.assignment(bumper), session.command_handle(CustomCommand::ViewModifier));
        let right_y = session.mapper().axis(AxisRole::RightY).unwrap();
        assert_eq!(host.axis_assignment(right_y), AXIS_PITCH);
        let left_x = session.mapper().axis(AxisRole::LeftX).unwrap();
        assert_eq!(host.axis_assignment(left_x), AXIS_YAW);
    }

    #[test]
    fn test_aircraft_load_schedules_cockpit_view() {
        let (mut session, mut host) = session();
        session.receive_message(PluginMessage::AircraftLoaded);
        session.frame(&mut host, 0.02);
        session.frame(&mut host, 0.02);
        assert_eq!(host.once_count(commands::VIEW_3D_COCKPIT), 1);
    }

    #[test]
    fn test_indicator_position_is_persisted() {
        let path = std::env::temp_dir()
            .join(format!("flightpad-session-{}", std::process::id()))
            .join("settings.toml");
        let mut session = Session::new(
            Settings::default(),
            Some(path.clone()),
            Arc::new(RecordingInjector::new()),
        );
        session.set_indicator_position(120, 80);

        let saved = Settings::load(&path).unwrap();
        assert_eq!((saved.indicator_x, saved.indicator_y), (120, 80));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_touchpad_makes_mouse_button_toggle_keyboard() {
        let (mut session, mut host) = session();
        let injector: Arc<dyn InputInjector> = Arc::new(RecordingInjector::new());
        session.attach_touchpad(TouchpadFeed::spawn(IdleTouchpad, injector).unwrap());
        assert!(session.touchpad_active());

        press(&mut session, &mut host, CustomCommand::MouseOrKeyboard, CommandPhase::Begin);
        assert_eq!(session.mode(), Mode::Keyboard);
        assert!(host.overlay_visible(Overlay::Keyboard));
        press(&mut session, &mut host, CustomCommand::MouseOrKeyboard, CommandPhase::End);
        assert_eq!(session.mode(), Mode::Keyboard);

        press(&mut session, &mut host, CustomCommand::MouseOrKeyboard, CommandPhase::Begin);
        assert_eq!(session.mode(), Mode::Default);
        assert!(!host.overlay_visible(Overlay::Keyboard));
        press(&mut session, &mut host, CustomCommand::MouseOrKeyboard, CommandPhase::End);
        assert_eq!(session.mode(), Mode::Default);
        assert!(!host.overlay_visible(Overlay::Mouse));
        assert_eq!(session.stack_depth(), 0);

        session.stop(&mut host);
        assert!(!session.touchpad_active());
    }

    #[test]
    fn test_stop_unregisters_and_rests() {
        let (mut session, mut host) = session();
        press(&mut session, &mut host, CustomCommand::TrimModifier, CommandPhase::Begin);
        session.stop(&mut host);
        assert_eq!(session.mode(), Mode::Default);
        assert_eq!(session.stack_depth(), 0);
        assert_eq!(host.registered_handler_count(), 0);
    }
}
