//! Sicherung und Wiederherstellung der Zuweisungstabellen
//!
//! Jeder Modus, der Tasten umbelegt, legt vorher einen Schnappschuss der
//! Host-Tabellen auf den Stack und stellt ihn beim Verlassen wieder her.
//! Die Reihenfolge ist strikt LIFO.

use crate::host::{datarefs, AssignmentSlot, Host, AXIS_COUNT, BUTTON_COUNT};
use tracing::{debug, warn};

/// Maximale Stacktiefe; darüber hinaus wird ein Push verworfen
pub const STACK_LIMIT: usize = 16;

/// Vollständige Kopie der Tasten- und Achsenzuweisungen
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSnapshot {
    buttons: Box<[AssignmentSlot]>,
    axes: Box<[i32]>,
}

impl AssignmentSnapshot {
    /// Liest beide Tabellen vom Host
    pub fn capture(host: &dyn Host) -> Self {
        let mut buttons = vec![None; BUTTON_COUNT].into_boxed_slice();
        host.read_button_assignments(&mut buttons);

        let mut axes = vec![0; AXIS_COUNT].into_boxed_slice();
        let read = host.get_i32_array(datarefs::JOYSTICK_AXIS_ASSIGNMENTS, &mut axes);
        if read < AXIS_COUNT {
            debug!("Axis assignment table has only {} entries", read);
        }

        Self { buttons, axes }
    }

    /// Schreibt beide Tabellen zurück
    pub fn restore(&self, host: &mut dyn Host) {
        host.write_button_assignments(0, &self.buttons);
        host.set_i32_array(datarefs::JOYSTICK_AXIS_ASSIGNMENTS, &self.axes);
    }

    pub fn buttons(&self) -> &[AssignmentSlot] {
        &self.buttons
    }

    pub fn axes(&self) -> &[i32] {
        &self.axes
    }
}

/// LIFO-Stack der Schnappschüsse
///
/// Ein Push oberhalb von [`STACK_LIMIT`] wird übersprungen und gezählt; der
/// passende Pop ist dann ein No-op, damit die übrigen Paare korrekt bleiben.
#[derive(Debug, Default)]
pub struct AssignmentStack {
    frames: Vec<AssignmentSnapshot>,
    skipped: usize,
}

impl AssignmentStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, host: &dyn Host) {
        if self.skipped > 0 || self.frames.len() >= STACK_LIMIT {
            self.skipped += 1;
            warn!(
                "Assignment stack full ({} frames), push skipped",
                self.frames.len()
            );
            return;
        }
        self.frames.push(AssignmentSnapshot::capture(host));
        debug!("Assignments pushed, depth {}", self.frames.len());
    }

    pub fn pop(&mut self, host: &mut dyn Host) {
        if self.skipped > 0 {
            self.skipped -= 1;
            debug!("Pop matches a skipped push, nothing restored");
            return;
        }
        match self.frames.pop() {
            Some(snapshot) => {
                snapshot.restore(host);
                debug!("Assignments popped, depth {}", self.frames.len());
            }
            None => debug!("Pop on empty assignment stack ignored"),
        }
    }

    /// Stellt den ältesten Zustand wieder her und leert den Stack
    pub fn drain(&mut self, host: &mut dyn Host) {
        self.skipped = 0;
        while !self.frames.is_empty() {
            self.pop(host);
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len() + self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }
}
