//! Achsverarbeitung pro Frame
//!
//! Liest die Rohachsen des Hosts, filtert die linke Y-Achse bis zur ersten
//! vollen Auslenkung, behandelt den Bremsabzug und verteilt die Auslenkung
//! des linken Sticks je nach Modus auf die Zielgröße.
//!
//! Reihenfolge der Ziele (erster Treffer gewinnt):
//! View → PropOrThrottle → Mixture → Cowl → Mouse → Default

use crate::controller::profile::{AxisRole, BrakeTrigger, ButtonRole, IndexMapper};
use crate::host::datarefs::{self, commands};
use crate::host::{Host, InputInjector, AXIS_COUNT};
use crate::mapping::modes::{Mode, ModeMachine};
use crate::mapping::response::{
    axis_delta, clamp_ratio, clamp_speedbrake, deflection, normalize, pan_repeats, AXIS_CENTER,
};
use tracing::debug;

/// Raten je Sekunde bei voller Auslenkung
pub const THROTTLE_RATE: f32 = 0.75;
pub const PROP_RATE: f32 = 0.75;
pub const MIXTURE_RATE: f32 = 0.5;
pub const COWL_RATE: f32 = 0.5;
pub const SPEEDBRAKE_RATE: f32 = 0.75;
/// Grad Blattwinkel pro Sekunde
pub const HELI_PITCH_RATE: f32 = 10.0;
/// rad/s Drehzahlsollwert pro Sekunde
pub const GOVERNOR_RATE: f32 = 50.0;
/// Grad pro Sekunde
pub const VIEW_YAW_RATE: f32 = 180.0;
pub const VIEW_PITCH_RATE: f32 = 90.0;
/// Pixel pro Sekunde
pub const MOUSE_RATE: f32 = 1200.0;

/// Bremsabzug gilt ab halbem Weg als gezogen
pub const BRAKE_ENGAGED: f32 = 0.5;
/// Unterhalb dieser linken X-Auslenkung wird rechts nicht gebremst
pub const STEER_LEFT: f32 = 0.3;
/// Oberhalb dieser linken X-Auslenkung wird links nicht gebremst
pub const STEER_RIGHT: f32 = 0.7;

const GUARD_LOW: f32 = 0.25;
const GUARD_HIGH: f32 = 0.75;
const REVERSER_DEPLOYED: f32 = 0.5;
const HEAD_PITCH_LIMIT: f32 = 89.0;
const MAX_ENGINES: usize = 16;

/// Sperrt eine Achse, bis sie einmal beide Endbereiche gesehen hat
///
/// Manche Achsen melden nach dem Einschalten einen Endwert statt der Mitte.
#[derive(Debug, Clone)]
pub struct AxisGuard {
    min: f32,
    max: f32,
}

impl Default for AxisGuard {
    fn default() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }
}

impl AxisGuard {
    pub fn filter(&mut self, raw: f32) -> f32 {
        self.min = self.min.min(raw);
        self.max = self.max.max(raw);
        if self.is_released() {
            raw
        } else {
            AXIS_CENTER
        }
    }

    pub fn is_released(&self) -> bool {
        self.min <= GUARD_LOW && self.max >= GUARD_HIGH
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Position des Bremsabzugs normiert auf [0, 1]
pub fn brake_engagement(raw: f32, trigger: &BrakeTrigger) -> f32 {
    normalize(raw, trigger.released, trigger.pressed, 0.0, 1.0).clamp(0.0, 1.0)
}

/// Eingaben eines Frames, die nicht im Host liegen
pub struct FrameInput<'a> {
    pub mapper: &'a IndexMapper,
    pub injector: &'a dyn InputInjector,
    pub nullzone: f32,
    pub dt: f32,
}

#[derive(Debug, Default)]
pub struct AxisEngine {
    left_y: AxisGuard,
    // Nachkommaanteil der Mausbewegung
    mouse_remainder: (f32, f32),
}

impl AxisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.left_y.reset();
        self.mouse_remainder = (0.0, 0.0);
    }

    pub fn left_y_released(&self) -> bool {
        self.left_y.is_released()
    }

    pub fn update(&mut self, host: &mut dyn Host, machine: &mut ModeMachine, input: &FrameInput) {
        if host.get_i32(datarefs::HAS_JOYSTICK).unwrap_or(0) == 0 {
            return;
        }

        let mut axes = [AXIS_CENTER; AXIS_COUNT];
        if host.get_f32_array(datarefs::JOYSTICK_AXIS_VALUES, &mut axes) == 0 {
            return;
        }
        let read = |role: AxisRole| input.mapper.axis(role).map(|index| axes[index]);

        let lx = read(AxisRole::LeftX).unwrap_or(AXIS_CENTER);
        let ly = self.left_y.filter(read(AxisRole::LeftY).unwrap_or(AXIS_CENTER));

        let trigger = input.mapper.profile().brake_trigger;
        if let Some(raw) = read(trigger.axis) {
            self.update_brakes(host, machine, input, brake_engagement(raw, &trigger), lx);
        }

        match machine.current() {
            Mode::View => self.look(host, input, lx, ly),
            Mode::PropOrThrottle => prop_or_governor(host, input, ly),
            Mode::Mixture => adjust_ratio(
                host,
                datarefs::MIXTURE_RATIO_ALL,
                forward(ly, input, MIXTURE_RATE),
            ),
            Mode::Cowl => cowl_flaps(host, forward(ly, input, COWL_RATE)),
            Mode::Mouse => self.move_pointer(input, lx, ly),
            _ => default_target(host, input, ly),
        }
    }

    fn update_brakes(
        &mut self,
        host: &mut dyn Host,
        machine: &mut ModeMachine,
        input: &FrameInput,
        engagement: f32,
        lx: f32,
    ) {
        let engaged = engagement >= BRAKE_ENGAGED;
        if engaged && !machine.brake_bound() {
            let slot = input.mapper.button(ButtonRole::FaceLeft);
            let command = host.find_command(commands::BRAKES_TOGGLE_MAX);
            machine.bind_brake(host, slot, command);
        } else if !engaged && machine.brake_bound() {
            machine.release_brake(host);
        }

        if !machine.brake_bound() {
            return;
        }

        let (mut left, mut right) = (engagement, engagement);
        if machine.is(Mode::Default) {
            if lx < STEER_LEFT {
                right = 0.0;
            } else if lx > STEER_RIGHT {
                left = 0.0;
            }
        }
        host.set_f32(datarefs::LEFT_BRAKE_RATIO, left);
        host.set_f32(datarefs::RIGHT_BRAKE_RATIO, right);
    }

    fn look(&mut self, host: &mut dyn Host, input: &FrameInput, lx: f32, ly: f32) {
        let view_type = host.get_i32(datarefs::VIEW_TYPE).unwrap_or(0);
        if view_type == datarefs::VIEW_TYPE_3D_COCKPIT {
            let yaw = axis_delta(lx, input.nullzone, VIEW_YAW_RATE, input.dt);
            let pitch = -axis_delta(ly, input.nullzone, VIEW_PITCH_RATE, input.dt);
            if yaw != 0.0 {
                if let Some(psi) = host.get_f32(datarefs::PILOTS_HEAD_PSI) {
                    host.set_f32(datarefs::PILOTS_HEAD_PSI, wrap_degrees(psi + yaw));
                }
            }
            if pitch != 0.0 {
                if let Some(the) = host.get_f32(datarefs::PILOTS_HEAD_THE) {
                    let the = (the + pitch).clamp(-HEAD_PITCH_LIMIT, HEAD_PITCH_LIMIT);
                    host.set_f32(datarefs::PILOTS_HEAD_THE, the);
                }
            }
            return;
        }

        // 2D-Ansichten kennen nur diskrete Schwenk-Kommandos
        let dx = deflection(lx, input.nullzone);
        let dy = deflection(ly, input.nullzone);
        let horizontal = if dx < 0.0 { commands::PAN_LEFT } else { commands::PAN_RIGHT };
        let vertical = if dy < 0.0 { commands::PAN_UP } else { commands::PAN_DOWN };
        repeat_command(host, horizontal, pan_repeats(dx));
        repeat_command(host, vertical, pan_repeats(dy));
    }

    fn move_pointer(&mut self, input: &FrameInput, lx: f32, ly: f32) {
        let (rx, ry) = self.mouse_remainder;
        let x = axis_delta(lx, input.nullzone, MOUSE_RATE, input.dt) + rx;
        let y = axis_delta(ly, input.nullzone, MOUSE_RATE, input.dt) + ry;
        let (dx, dy) = (x.trunc(), y.trunc());
        self.mouse_remainder = (x - dx, y - dy);
        if dx != 0.0 || dy != 0.0 {
            input.injector.move_pointer(dx as i32, dy as i32);
        }
    }
}

/// Auslenkung nach vorn (Rohwert unter der Mitte) ergibt positive Änderung
fn forward(ly: f32, input: &FrameInput, rate: f32) -> f32 {
    -axis_delta(ly, input.nullzone, rate, input.dt)
}

fn is_set(host: &dyn Host, path: &str) -> bool {
    host.get_i32(path).unwrap_or(0) != 0
}

fn first_element(host: &dyn Host, path: &str) -> Option<f32> {
    let mut value = [0.0];
    (host.get_f32_array(path, &mut value) > 0).then_some(value[0])
}

fn adjust_ratio(host: &mut dyn Host, path: &str, delta: f32) {
    if delta == 0.0 {
        return;
    }
    if let Some(value) = host.get_f32(path) {
        host.set_f32(path, clamp_ratio(value + delta));
    }
}

fn repeat_command(host: &mut dyn Host, name: &str, count: u32) {
    if count == 0 {
        return;
    }
    if let Some(command) = host.find_command(name) {
        for _ in 0..count {
            host.command_once(command);
        }
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

fn prop_or_governor(host: &mut dyn Host, input: &FrameInput, ly: f32) {
    if !is_set(host, datarefs::IS_HELICOPTER) {
        adjust_ratio(host, datarefs::PROP_RATIO_ALL, forward(ly, input, PROP_RATE));
        return;
    }

    let delta = forward(ly, input, GOVERNOR_RATE);
    if delta == 0.0 {
        return;
    }
    let (Some(min), Some(max)) = (
        host.get_f32(datarefs::GOVERNOR_MIN_RAD_SEC),
        host.get_f32(datarefs::GOVERNOR_MAX_RAD_SEC),
    ) else {
        debug!("Governor range unknown");
        return;
    };
    if let Some(rpm) = host.get_f32(datarefs::PROP_SPEED_RAD_SEC_ALL) {
        host.set_f32(
            datarefs::PROP_SPEED_RAD_SEC_ALL,
            (rpm + delta).clamp(min.min(max), max.max(min)),
        );
    }
}

fn cowl_flaps(host: &mut dyn Host, delta: f32) {
    if delta == 0.0 {
        return;
    }
    let engines = host
        .get_i32(datarefs::NUM_ENGINES)
        .unwrap_or(1)
        .clamp(1, MAX_ENGINES as i32) as usize;

    let mut ratios = [0.0; MAX_ENGINES];
    if host.get_f32_array(datarefs::COWL_FLAP_RATIO, &mut ratios) == 0 {
        return;
    }
    let value = clamp_ratio(ratios[0] + delta);
    ratios[..engines].fill(value);
    host.set_f32_array(datarefs::COWL_FLAP_RATIO, &ratios[..engines]);
}

fn default_target(host: &mut dyn Host, input: &FrameInput, ly: f32) {
    if is_set(host, datarefs::IS_HELICOPTER) {
        let delta = forward(ly, input, HELI_PITCH_RATE);
        if delta == 0.0 {
            return;
        }
        let min = first_element(host, datarefs::PROP_MIN_PITCH).unwrap_or(f32::MIN);
        let max = first_element(host, datarefs::PROP_MAX_PITCH).unwrap_or(f32::MAX);
        if let Some(pitch) = host.get_f32(datarefs::PROP_PITCH_DEG_ALL) {
            host.set_f32(
                datarefs::PROP_PITCH_DEG_ALL,
                (pitch + delta).clamp(min.min(max), max.max(min)),
            );
        }
    } else if is_set(host, datarefs::IS_GLIDER) && is_set(host, datarefs::HAS_SPEEDBRAKE) {
        // Stick nach hinten fährt die Bremsklappen aus
        let delta = -forward(ly, input, SPEEDBRAKE_RATE);
        if delta == 0.0 {
            return;
        }
        if let Some(current) = host.get_f32(datarefs::SPEEDBRAKE_RATIO) {
            let disarmed = current.max(0.0);
            host.set_f32(datarefs::SPEEDBRAKE_RATIO, clamp_speedbrake(disarmed + delta));
        }
    } else {
        let mut delta = forward(ly, input, THROTTLE_RATE);
        let reversed = first_element(host, datarefs::THRUST_REVERSER_DEPLOY_RATIO)
            .is_some_and(|r| r > REVERSER_DEPLOYED);
        if reversed {
            delta = -delta;
        }
        adjust_ratio(host, datarefs::THROTTLE_RATIO_ALL, delta);
    }
}
