//! Dataref paths and simulator command names used by the plugin

// Joystick tables
pub const JOYSTICK_AXIS_VALUES: &str = "sim/joystick/joystick_axis_values";
pub const JOYSTICK_BUTTON_VALUES: &str = "sim/joystick/joystick_button_values";
pub const JOYSTICK_AXIS_ASSIGNMENTS: &str = "sim/joystick/joystick_axis_assignments";
pub const JOYSTICK_AXIS_REVERSE: &str = "sim/joystick/joystick_axis_reverse";
pub const JOYSTICK_PITCH_NULLZONE: &str = "sim/joystick/joystick_pitch_nullzone";
pub const HAS_JOYSTICK: &str = "sim/joystick/has_joystick";

pub const TOTAL_RUNNING_TIME: &str = "sim/time/total_running_time_sec";

// Aircraft
pub const NUM_ENGINES: &str = "sim/aircraft/engine/acf_num_engines";
pub const IS_HELICOPTER: &str = "sim/aircraft2/metadata/is_helicopter";
pub const IS_GLIDER: &str = "sim/aircraft2/metadata/is_glider";
pub const HAS_SPEEDBRAKE: &str = "sim/aircraft/parts/acf_sbrkEQ";
pub const PROP_MIN_PITCH: &str = "sim/aircraft/prop/acf_min_pitch";
pub const PROP_MAX_PITCH: &str = "sim/aircraft/prop/acf_max_pitch";
pub const GOVERNOR_MIN_RAD_SEC: &str = "sim/aircraft/controls/acf_RSC_idlespeed_prp";
pub const GOVERNOR_MAX_RAD_SEC: &str = "sim/aircraft/controls/acf_RSC_redline_prp";

// Engine actuators
pub const THROTTLE_RATIO_ALL: &str = "sim/cockpit2/engine/actuators/throttle_ratio_all";
pub const MIXTURE_RATIO_ALL: &str = "sim/cockpit2/engine/actuators/mixture_ratio_all";
pub const PROP_RATIO_ALL: &str = "sim/cockpit2/engine/actuators/prop_ratio_all";
pub const PROP_PITCH_DEG_ALL: &str = "sim/cockpit2/engine/actuators/prop_pitch_deg_all";
pub const PROP_SPEED_RAD_SEC_ALL: &str =
    "sim/cockpit2/engine/actuators/prop_rotation_speed_rad_sec_all";
pub const COWL_FLAP_RATIO: &str = "sim/cockpit2/engine/actuators/cowl_flap_ratio";
pub const THRUST_REVERSER_DEPLOY_RATIO: &str =
    "sim/flightmodel2/engines/thrust_reverser_deploy_ratio";

// Controls
pub const SPEEDBRAKE_RATIO: &str = "sim/cockpit2/controls/speedbrake_ratio";
pub const LEFT_BRAKE_RATIO: &str = "sim/cockpit2/controls/left_brake_ratio";
pub const RIGHT_BRAKE_RATIO: &str = "sim/cockpit2/controls/right_brake_ratio";
pub const OVERRIDE_TOE_BRAKES: &str = "sim/operation/override/override_toe_brakes";

// Camera
pub const VIEW_TYPE: &str = "sim/graphics/view/view_type";
pub const CINEMA_VERITE: &str = "sim/graphics/view/cinema_verite";
pub const HEAD_SHAKE_OVERRIDE: &str = "sim/graphics/view/head_shake_override";
pub const PILOTS_HEAD_PSI: &str = "sim/graphics/view/pilots_head_psi";
pub const PILOTS_HEAD_THE: &str = "sim/graphics/view/pilots_head_the";
pub const PILOTS_HEAD_X: &str = "sim/graphics/view/pilots_head_x";
pub const PILOTS_HEAD_Y: &str = "sim/graphics/view/pilots_head_y";
pub const PILOTS_HEAD_Z: &str = "sim/graphics/view/pilots_head_z";

/// Host view type codes
pub const VIEW_TYPE_FORWARD_NOTHING: i32 = 1002;
pub const VIEW_TYPE_3D_COCKPIT: i32 = 1026;

pub mod commands {
    pub const VIEW_3D_COCKPIT: &str = "sim/view/3d_cockpit_cmnd_look";
    pub const VIEW_FORWARD_NOTHING: &str = "sim/view/forward_with_nothing";
    pub const VIEW_CHASE: &str = "sim/view/chase";
    pub const VIEW_FREE_CAMERA: &str = "sim/view/free_camera";

    pub const PAN_LEFT: &str = "sim/general/left";
    pub const PAN_RIGHT: &str = "sim/general/right";
    pub const PAN_UP: &str = "sim/general/up";
    pub const PAN_DOWN: &str = "sim/general/down";
    pub const HEAD_FORWARD: &str = "sim/general/forward";
    pub const HEAD_BACKWARD: &str = "sim/general/backward";

    pub const BRAKES_TOGGLE_MAX: &str = "sim/flight_controls/brakes_toggle_max";
    pub const FLAPS_UP: &str = "sim/flight_controls/flaps_up";
    pub const FLAPS_DOWN: &str = "sim/flight_controls/flaps_down";
    pub const GEAR_TOGGLE: &str = "sim/flight_controls/landing_gear_toggle";
    pub const PARKING_BRAKE_TOGGLE: &str = "sim/flight_controls/brakes_toggle_regular";

    pub const PITCH_TRIM_UP: &str = "sim/flight_controls/pitch_trim_up";
    pub const PITCH_TRIM_DOWN: &str = "sim/flight_controls/pitch_trim_down";
    pub const AILERON_TRIM_LEFT: &str = "sim/flight_controls/aileron_trim_left";
    pub const AILERON_TRIM_RIGHT: &str = "sim/flight_controls/aileron_trim_right";
    pub const RUDDER_TRIM_LEFT: &str = "sim/flight_controls/rudder_trim_left";
    pub const RUDDER_TRIM_RIGHT: &str = "sim/flight_controls/rudder_trim_right";
    pub const FORCE_TRIM: &str = "sim/flight_controls/force_trim";

    pub const CARB_HEAT_TOGGLE: &str = "sim/engines/carb_heat_toggle";
    pub const BETA_TOGGLE: &str = "sim/engines/beta_toggle";
    pub const THRUST_REVERSE_TOGGLE: &str = "sim/engines/thrust_reverse_toggle";
    pub const AUTOPILOT_SERVOS_TOGGLE: &str = "sim/autopilot/servos_toggle";
    pub const FLIGHT_DIRECTOR_OFF: &str = "sim/autopilot/fdir_off";
}
