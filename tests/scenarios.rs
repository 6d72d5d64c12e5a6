//! End-to-end scenarios: raw button and axis values go into a MemoryHost,
//! the host dispatches commands through the live assignment table and the
//! plugin runs its frame callback, exactly as in the simulator.

use flightpad::commands::CustomCommand;
use flightpad::config::Settings;
use flightpad::controller::{AxisRole, ButtonRole, CalibrationOffsets, CalibrationState};
use flightpad::host::datarefs::{self, commands};
use flightpad::host::{
    AssignmentSlot, CommandPhase, Host, InjectedEvent, MemoryHost, Overlay, RecordingInjector,
    AXIS_COUNT,
};
use flightpad::mapping::Mode;
use flightpad::plugin::{Loaded, Plugin, Running};
use std::sync::Arc;

const FRAME: f32 = 0.02;

struct Sim {
    host: MemoryHost,
    plugin: Plugin<Running>,
    injector: Arc<RecordingInjector>,
}

impl Sim {
    fn new() -> Self {
        let injector = Arc::new(RecordingInjector::new());
        let mut host = MemoryHost::with_default_aircraft();
        let plugin =
            Plugin::<Loaded>::create(Settings::default(), None, injector.clone()).enable(&mut host);
        let mut sim = Self {
            host,
            plugin,
            injector,
        };

        sim.trigger(false);
        sim.stick(AxisRole::LeftY, 0.0);
        sim.frame();
        sim.stick(AxisRole::LeftY, 1.0);
        sim.frame();
        sim.stick(AxisRole::LeftY, 0.5);
        sim.plugin
            .session_mut()
            .apply_default_assignments(&mut sim.host);
        sim.frame();
        sim
    }

    fn button(&self, role: ButtonRole) -> usize {
        self.plugin.session().mapper().button(role).unwrap()
    }

    fn axis(&self, role: AxisRole) -> usize {
        self.plugin.session().mapper().axis(role).unwrap()
    }

    fn stick(&mut self, role: AxisRole, value: f32) {
        let index = self.axis(role);
        self.host.set_axis(index, value);
    }

    fn trigger(&mut self, pulled: bool) {
        let trigger = self.plugin.session().mapper().profile().brake_trigger;
        let value = if pulled { trigger.pressed } else { trigger.released };
        self.stick(trigger.axis, value);
    }

    fn hold(&mut self, role: ButtonRole) {
        let index = self.button(role);
        self.host.set_button(index, true);
    }

    fn release(&mut self, role: ButtonRole) {
        let index = self.button(role);
        self.host.set_button(index, false);
    }

    fn tap(&mut self, role: ButtonRole) {
        self.hold(role);
        self.frame();
        self.release(role);
        self.frame();
    }

    fn frame(&mut self) {
        self.host.advance_time(FRAME);
        for (command, phase) in self.host.dispatch_buttons() {
            self.plugin.handle_command(&mut self.host, command, phase);
        }
        self.plugin.flight_loop(&mut self.host, FRAME);
    }

    fn frames(&mut self, count: usize) {
        for _ in 0..count {
            self.frame();
        }
    }

    fn run(&mut self, command: CustomCommand) {
        let handle = self.plugin.session().command_handle(command).unwrap();
        self.plugin
            .handle_command(&mut self.host, handle, CommandPhase::Begin);
        self.plugin
            .handle_command(&mut self.host, handle, CommandPhase::End);
    }

    fn mode(&self) -> Mode {
        self.plugin.session().mode()
    }

    fn buttons(&self) -> Vec<AssignmentSlot> {
        self.host.assignments().to_vec()
    }

    fn axes(&self) -> Vec<i32> {
        let mut table = vec![0; AXIS_COUNT];
        self.host
            .get_i32_array(datarefs::JOYSTICK_AXIS_ASSIGNMENTS, &mut table);
        table
    }

    fn float(&self, path: &str) -> f32 {
        self.host.get_f32(path).unwrap()
    }
}

#[test]
fn every_modifier_restores_the_assignments_it_found() {
    let mut sim = Sim::new();
    let buttons = sim.buttons();
    let axes = sim.axes();

    sim.hold(ButtonRole::BumperLeft);
    sim.frame();
    assert_eq!(sim.mode(), Mode::View);
    assert_ne!(sim.buttons(), buttons);
    assert_ne!(sim.axes(), axes);
    sim.release(ButtonRole::BumperLeft);
    sim.frame();

    sim.tap(ButtonRole::BumperRight);
    sim.tap(ButtonRole::StickLeft);

    // short press enters mouse mode, the next press leaves it
    sim.tap(ButtonRole::CenterLeft);
    assert_eq!(sim.mode(), Mode::Mouse);
    sim.tap(ButtonRole::CenterLeft);

    assert_eq!(sim.mode(), Mode::Default);
    assert_eq!(sim.plugin.session().stack_depth(), 0);
    assert_eq!(sim.buttons(), buttons);
    assert_eq!(sim.axes(), axes);
}

#[test]
fn second_modifier_is_ignored_while_one_is_held() {
    let mut sim = Sim::new();
    let buttons = sim.buttons();

    sim.hold(ButtonRole::BumperLeft);
    sim.frame();
    sim.hold(ButtonRole::BumperRight);
    sim.frame();
    assert_eq!(sim.mode(), Mode::View);
    let up = sim.button(ButtonRole::DpadUp);
    assert_eq!(
        sim.host.assignment(up),
        sim.host.find_command(commands::HEAD_FORWARD)
    );

    sim.release(ButtonRole::BumperRight);
    sim.frame();
    assert_eq!(sim.mode(), Mode::View);
    sim.release(ButtonRole::BumperLeft);
    sim.frame();

    assert_eq!(sim.mode(), Mode::Default);
    assert_eq!(sim.plugin.session().stack_depth(), 0);
    assert_eq!(sim.buttons(), buttons);
}

#[test]
fn brake_trigger_steers_with_differential_braking() {
    let mut sim = Sim::new();
    let buttons = sim.buttons();

    sim.trigger(true);
    sim.stick(AxisRole::LeftX, 0.0);
    sim.frame();
    assert_eq!(sim.host.get_i32(datarefs::OVERRIDE_TOE_BRAKES), Some(1));
    assert_eq!(sim.float(datarefs::LEFT_BRAKE_RATIO), 1.0);
    assert_eq!(sim.float(datarefs::RIGHT_BRAKE_RATIO), 0.0);
    let face_left = sim.button(ButtonRole::FaceLeft);
    assert_eq!(
        sim.host.assignment(face_left),
        sim.host.find_command(commands::BRAKES_TOGGLE_MAX)
    );

    sim.stick(AxisRole::LeftX, 0.5);
    sim.frame();
    assert_eq!(sim.float(datarefs::RIGHT_BRAKE_RATIO), 1.0);

    sim.trigger(false);
    sim.frame();
    assert_eq!(sim.host.get_i32(datarefs::OVERRIDE_TOE_BRAKES), Some(0));
    assert_eq!(sim.float(datarefs::LEFT_BRAKE_RATIO), 0.0);
    assert_eq!(sim.buttons(), buttons);
}

#[test]
fn brake_release_waits_for_the_enclosing_mode() {
    let mut sim = Sim::new();
    let buttons = sim.buttons();

    sim.trigger(true);
    sim.frame();
    sim.hold(ButtonRole::BumperLeft);
    sim.frame();
    assert_eq!(sim.plugin.session().stack_depth(), 2);

    sim.trigger(false);
    sim.frame();
    assert_eq!(sim.host.get_i32(datarefs::OVERRIDE_TOE_BRAKES), Some(1));

    sim.release(ButtonRole::BumperLeft);
    sim.frame();
    assert_eq!(sim.host.get_i32(datarefs::OVERRIDE_TOE_BRAKES), Some(0));
    assert_eq!(sim.plugin.session().stack_depth(), 0);
    assert_eq!(sim.buttons(), buttons);
}

#[test]
fn full_forward_stick_ramps_throttle_at_its_rate() {
    let mut sim = Sim::new();
    sim.stick(AxisRole::LeftY, 0.0);

    let mut last = sim.float(datarefs::THROTTLE_RATIO_ALL);
    for _ in 0..10 {
        sim.frame();
        let throttle = sim.float(datarefs::THROTTLE_RATIO_ALL);
        assert!(throttle > last);
        last = throttle;
    }
    assert!((last - 0.15).abs() < 1e-3, "throttle {}", last);

    sim.frames(200);
    assert_eq!(sim.float(datarefs::THROTTLE_RATIO_ALL), 1.0);
}

#[test]
fn calibration_detects_both_offsets() {
    let mut sim = Sim::new();
    let right_y = sim.axis(AxisRole::RightY);
    let face_down = sim.button(ButtonRole::FaceDown);

    sim.run(CustomCommand::Calibrate);
    assert_eq!(sim.plugin.session().calibration_state(), CalibrationState::Axes);

    sim.host.set_axis(right_y + 3, 0.95);
    sim.frame();
    assert_eq!(sim.plugin.session().calibration_state(), CalibrationState::Axes);
    sim.host.set_axis(right_y + 3, 0.05);
    sim.frame();
    assert_eq!(
        sim.plugin.session().calibration_state(),
        CalibrationState::Buttons
    );
    sim.host.set_axis(right_y + 3, 0.5);

    sim.frame();
    sim.host.set_button(face_down + 5, true);
    sim.frame();
    sim.host.set_button(face_down + 5, false);
    sim.frame();

    let session = sim.plugin.session();
    assert_eq!(session.calibration_state(), CalibrationState::Done);
    assert_eq!(
        session.settings().offsets(),
        CalibrationOffsets {
            axis_offset: 3,
            button_offset: 5,
        }
    );
    assert_eq!(session.mapper().axis(AxisRole::RightY), Some(right_y + 3));
    assert_eq!(sim.host.axis_assignment(right_y + 3), 1);
    assert_eq!(
        sim.host.assignment(face_down + 5),
        session.command_handle(CustomCommand::PropModifier)
    );

    sim.run(CustomCommand::CalibrateAbort);
    assert_eq!(sim.plugin.session().calibration_state(), CalibrationState::Start);
}

#[test]
fn aborted_calibration_keeps_offsets() {
    let mut sim = Sim::new();
    sim.run(CustomCommand::Calibrate);
    sim.run(CustomCommand::CalibrateAbort);

    let session = sim.plugin.session();
    assert_eq!(session.calibration_state(), CalibrationState::Abort);
    assert_eq!(session.settings().offsets(), CalibrationOffsets::default());

    sim.run(CustomCommand::CalibrateAbort);
    assert_eq!(sim.plugin.session().calibration_state(), CalibrationState::Start);
}

#[test]
fn calibration_started_under_a_modifier_leaves_no_mode_behind() {
    let mut sim = Sim::new();
    sim.host.insert_i32(datarefs::CINEMA_VERITE, 1);
    let buttons = sim.buttons();
    let axes = sim.axes();

    sim.hold(ButtonRole::BumperLeft);
    sim.frame();
    assert_eq!(sim.mode(), Mode::View);

    sim.run(CustomCommand::Calibrate);
    assert_eq!(sim.plugin.session().calibration_state(), CalibrationState::Axes);
    assert_eq!(sim.mode(), Mode::Default);
    assert_eq!(sim.host.get_i32(datarefs::CINEMA_VERITE), Some(1));

    sim.release(ButtonRole::BumperLeft);
    sim.frame();
    sim.run(CustomCommand::CalibrateAbort);
    sim.frame();

    assert_eq!(sim.plugin.session().calibration_state(), CalibrationState::Abort);
    assert_eq!(sim.mode(), Mode::Default);
    assert_eq!(sim.plugin.session().stack_depth(), 0);
    assert_eq!(sim.host.get_i32(datarefs::CINEMA_VERITE), Some(1));
    assert_eq!(sim.buttons(), buttons);
    assert_eq!(sim.axes(), axes);
}

#[test]
fn long_press_arms_speedbrake_short_press_toggles() {
    let mut sim = Sim::new();
    sim.host.insert_i32(datarefs::HAS_SPEEDBRAKE, 1);

    sim.hold(ButtonRole::FaceUp);
    sim.frames(60);
    sim.release(ButtonRole::FaceUp);
    sim.frame();
    assert_eq!(sim.float(datarefs::SPEEDBRAKE_RATIO), -0.5);

    sim.tap(ButtonRole::FaceUp);
    assert_eq!(sim.float(datarefs::SPEEDBRAKE_RATIO), 1.0);
}

#[test]
fn long_press_opens_keyboard_and_types() {
    let mut sim = Sim::new();
    let buttons = sim.buttons();

    sim.hold(ButtonRole::CenterLeft);
    sim.frames(60);
    assert_eq!(sim.mode(), Mode::Keyboard);
    sim.release(ButtonRole::CenterLeft);
    sim.frame();
    assert_eq!(sim.mode(), Mode::Keyboard);
    assert!(sim.host.overlay_visible(Overlay::Keyboard));

    sim.tap(ButtonRole::DpadRight);
    sim.tap(ButtonRole::FaceDown);
    let keys: Vec<InjectedEvent> = sim
        .injector
        .events()
        .into_iter()
        .filter(|e| matches!(e, InjectedEvent::Key { .. }))
        .collect();
    assert_eq!(
        keys,
        vec![
            InjectedEvent::Key {
                code: 0x1e,
                down: true
            },
            InjectedEvent::Key {
                code: 0x1e,
                down: false
            },
        ]
    );

    sim.tap(ButtonRole::CenterLeft);
    assert_eq!(sim.mode(), Mode::Default);
    assert!(!sim.host.overlay_visible(Overlay::Keyboard));
    assert_eq!(sim.buttons(), buttons);
}

#[test]
fn disable_in_the_middle_of_a_mode_forces_rest() {
    let mut sim = Sim::new();
    sim.host.insert_i32(datarefs::CINEMA_VERITE, 1);
    let buttons = sim.buttons();
    let axes = sim.axes();

    sim.trigger(true);
    sim.frame();
    sim.hold(ButtonRole::BumperLeft);
    sim.frame();
    assert_eq!(sim.host.get_i32(datarefs::CINEMA_VERITE), Some(0));

    let Sim {
        mut host, plugin, ..
    } = sim;
    let _stopped = plugin.disable(&mut host);

    assert_eq!(host.get_i32(datarefs::CINEMA_VERITE), Some(1));
    assert_eq!(host.get_i32(datarefs::HEAD_SHAKE_OVERRIDE), Some(0));
    assert_eq!(host.get_i32(datarefs::OVERRIDE_TOE_BRAKES), Some(0));
    assert_eq!(host.assignments(), &buttons[..]);
    let mut table = vec![0; AXIS_COUNT];
    host.get_i32_array(datarefs::JOYSTICK_AXIS_ASSIGNMENTS, &mut table);
    assert_eq!(table, axes);
    assert_eq!(host.registered_handler_count(), 0);
}
