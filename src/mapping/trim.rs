//! Trimmbelegung mit flugzeugspezifischen Kommandos
//!
//! Einige Add-ons bringen eigene Trimmkommandos mit. Die bekannten Signaturen
//! werden in Prioritätsreihenfolge geprüft; fehlt ein Kommando, greift das
//! Standardkommando des Simulators.

use crate::controller::profile::{ButtonRole, IndexMapper};
use crate::host::datarefs::{self, commands};
use crate::host::{CommandRef, Host};
use tracing::{debug, info};

/// Kommandonamen für einen Trimmsatz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimCommands {
    pub signature: Option<&'static str>,
    pub pitch_up: &'static str,
    pub pitch_down: &'static str,
    pub aileron_left: &'static str,
    pub aileron_right: &'static str,
    pub rudder_left: &'static str,
    pub rudder_right: &'static str,
}

pub static DEFAULT_TRIM: TrimCommands = TrimCommands {
    signature: None,
    pitch_up: commands::PITCH_TRIM_UP,
    pitch_down: commands::PITCH_TRIM_DOWN,
    aileron_left: commands::AILERON_TRIM_LEFT,
    aileron_right: commands::AILERON_TRIM_RIGHT,
    rudder_left: commands::RUDDER_TRIM_LEFT,
    rudder_right: commands::RUDDER_TRIM_RIGHT,
};

/// Bekannte Add-ons, höchste Priorität zuerst
pub static ADDON_TRIM: [TrimCommands; 3] = [
    TrimCommands {
        signature: Some("com.simcoders.rep"),
        pitch_up: "simcoders/rep/controls/pitch_trim_up",
        pitch_down: "simcoders/rep/controls/pitch_trim_down",
        aileron_left: "simcoders/rep/controls/aileron_trim_left",
        aileron_right: "simcoders/rep/controls/aileron_trim_right",
        rudder_left: "simcoders/rep/controls/rudder_trim_left",
        rudder_right: "simcoders/rep/controls/rudder_trim_right",
    },
    TrimCommands {
        signature: Some("zibomod.by.Zibo"),
        pitch_up: "laminar/B738/flight_controls/pitch_trim_up",
        pitch_down: "laminar/B738/flight_controls/pitch_trim_down",
        aileron_left: "laminar/B738/flight_controls/aileron_trim_left",
        aileron_right: "laminar/B738/flight_controls/aileron_trim_right",
        rudder_left: "laminar/B738/flight_controls/rudder_trim_left",
        rudder_right: "laminar/B738/flight_controls/rudder_trim_right",
    },
    TrimCommands {
        signature: Some("com.thranda.systems"),
        pitch_up: "thranda/trim/pitch_up",
        pitch_down: "thranda/trim/pitch_down",
        aileron_left: "thranda/trim/aileron_left",
        aileron_right: "thranda/trim/aileron_right",
        rudder_left: "thranda/trim/rudder_left",
        rudder_right: "thranda/trim/rudder_right",
    },
];

/// Wählt den ersten aktiven Add-on-Satz, sonst die Standardkommandos
pub fn select_trim(host: &dyn Host) -> &'static TrimCommands {
    ADDON_TRIM
        .iter()
        .find(|set| set.signature.is_some_and(|sig| host.is_plugin_enabled(sig)))
        .unwrap_or(&DEFAULT_TRIM)
}

fn resolve(host: &dyn Host, name: &str, fallback: &str) -> Option<CommandRef> {
    host.find_command(name).or_else(|| {
        debug!("Trim command {} missing, using {}", name, fallback);
        host.find_command(fallback)
    })
}

/// Belegt D-Pad und seitliche Face-Buttons mit den Trimmkommandos
pub fn bind_trim(host: &mut dyn Host, mapper: &IndexMapper) {
    let set = select_trim(host);
    if let Some(sig) = set.signature {
        info!("Using trim commands of {}", sig);
    }

    // D-Pad hoch = Nase runter
    let bindings = [
        (ButtonRole::DpadUp, set.pitch_down, DEFAULT_TRIM.pitch_down),
        (ButtonRole::DpadDown, set.pitch_up, DEFAULT_TRIM.pitch_up),
        (ButtonRole::DpadLeft, set.aileron_left, DEFAULT_TRIM.aileron_left),
        (ButtonRole::DpadRight, set.aileron_right, DEFAULT_TRIM.aileron_right),
        (ButtonRole::FaceLeft, set.rudder_left, DEFAULT_TRIM.rudder_left),
        (ButtonRole::FaceRight, set.rudder_right, DEFAULT_TRIM.rudder_right),
    ];

    for (role, name, fallback) in bindings {
        let command = resolve(host, name, fallback);
        if let Some(slot) = mapper.button(role) {
            host.write_button_assignments(slot, &[command]);
        }
    }
}

/// Startet Force-Trim für Hubschrauber; liefert das gehaltene Kommando
pub fn begin_force_trim(host: &mut dyn Host) -> Option<CommandRef> {
    if host.get_i32(datarefs::IS_HELICOPTER).unwrap_or(0) == 0 {
        return None;
    }
    let command = host.find_command(commands::FORCE_TRIM)?;
    host.command_begin(command);
    debug!("Force trim held");
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::profile::{CalibrationOffsets, ControllerType};
    use crate::host::MemoryHost;

    fn mapper() -> IndexMapper {
        IndexMapper::new(ControllerType::Xbox, CalibrationOffsets::default())
    }

    #[test]
    fn test_default_trim_without_addons() {
        let mut host = MemoryHost::with_default_aircraft();
        bind_trim(&mut host, &mapper());

        let up = mapper().button(ButtonRole::DpadUp).unwrap();
        assert_eq!(host.assignment(up), host.find_command(commands::PITCH_TRIM_DOWN));
        let face_left = mapper().button(ButtonRole::FaceLeft).unwrap();
        assert_eq!(host.assignment(face_left), host.find_command(commands::RUDDER_TRIM_LEFT));
    }

    #[test]
    fn test_addon_priority_order() {
        let mut host = MemoryHost::with_default_aircraft();
        host.enable_plugin("com.thranda.systems");
        host.enable_plugin("zibomod.by.Zibo");
        assert_eq!(select_trim(&host).signature, Some("zibomod.by.Zibo"));
    }

    #[test]
    fn test_missing_addon_command_falls_back() {
        let mut host = MemoryHost::with_default_aircraft();
        host.enable_plugin("com.simcoders.rep");
        let custom = host.define_command("simcoders/rep/controls/pitch_trim_down");
        bind_trim(&mut host, &mapper());

        let up = mapper().button(ButtonRole::DpadUp).unwrap();
        let right = mapper().button(ButtonRole::DpadRight).unwrap();
        assert_eq!(host.assignment(up), Some(custom));
        assert_eq!(host.assignment(right), host.find_command(commands::AILERON_TRIM_RIGHT));
    }

    #[test]
    fn test_force_trim_only_for_helicopters() {
        let mut host = MemoryHost::with_default_aircraft();
        assert_eq!(begin_force_trim(&mut host), None);

        host.insert_i32(datarefs::IS_HELICOPTER, 1);
        assert!(begin_force_trim(&mut host).is_some());
        assert!(host.is_held(commands::FORCE_TRIM));
    }
}
