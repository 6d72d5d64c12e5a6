//! Desktop bench: drives the plugin core against an in-memory host
//!
//! 1. [`gamepad`] - gilrs reader publishing [`gamepad::PadSnapshot`]s
//! 2. [`LoggingInjector`] - synthetic input that only logs
//! 3. [`apply_snapshot`] - writes a snapshot into the host's raw arrays

pub mod gamepad;

use flightpad::controller::profile::{AxisRole, ButtonRole};
use flightpad::controller::IndexMapper;
use flightpad::host::{InputInjector, MemoryHost, MouseButton};
use gamepad::PadSnapshot;
use tracing::{debug, info};

/// Logs synthetic input instead of sending it to the OS
#[derive(Debug, Default)]
pub struct LoggingInjector;

impl InputInjector for LoggingInjector {
    fn move_pointer(&self, dx: i32, dy: i32) {
        debug!("Pointer move {} {}", dx, dy);
    }

    fn mouse_button(&self, button: MouseButton, down: bool) {
        info!("Mouse {:?} {}", button, if down { "down" } else { "up" });
    }

    fn scroll(&self, clicks: i32) {
        info!("Scroll {}", clicks);
    }

    fn key(&self, code: u32, down: bool) {
        info!("Key 0x{:02x} {}", code, if down { "down" } else { "up" });
    }
}

/// Places the snapshot where the simulator would report this controller
pub fn apply_snapshot(host: &mut MemoryHost, mapper: &IndexMapper, snapshot: &PadSnapshot) {
    for role in AxisRole::ALL {
        if let (Some(index), Some(value)) = (mapper.axis(role), snapshot.axes.get(&role)) {
            host.set_axis(index, *value);
        }
    }
    for role in ButtonRole::ALL {
        if let Some(index) = mapper.button(role) {
            host.set_button(index, snapshot.buttons.contains(&role));
        }
    }
}
