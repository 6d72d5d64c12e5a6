//! Zustandsmaschine der Interaktionsmodi
//!
//! Genau ein Modus ist aktiv. `Default` ist der Ruhezustand und der einzige
//! Zustand, aus dem ein anderer Modus betreten werden darf; jeder andere
//! Modus kehrt nur nach `Default` zurück. Betreten und Verlassen koppeln
//! Push und Pop des [`AssignmentStack`], damit kein Handler das Paar
//! vergessen kann.

use crate::host::{datarefs, CommandRef, Host};
use crate::mapping::assignments::AssignmentStack;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Default,
    View,
    SwitchView,
    PropOrThrottle,
    Mixture,
    Cowl,
    Trim,
    Mouse,
    Keyboard,
}

impl Mode {
    /// Ob der Modus beim Betreten die Zuweisungen sichert
    pub fn saves_assignments(self) -> bool {
        matches!(
            self,
            Mode::View | Mode::SwitchView | Mode::Trim | Mode::Mouse | Mode::Keyboard
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Default => "default",
            Mode::View => "view",
            Mode::SwitchView => "switch view",
            Mode::PropOrThrottle => "prop/throttle",
            Mode::Mixture => "mixture",
            Mode::Cowl => "cowl flaps",
            Mode::Trim => "trim",
            Mode::Mouse => "mouse",
            Mode::Keyboard => "keyboard",
        };
        write!(f, "{}", name)
    }
}

/// Abgelehnte Modusübergänge
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("Cannot enter {requested} mode while {current} mode is active")]
    Busy { current: Mode, requested: Mode },

    #[error("Cannot leave {requested} mode, {current} mode is active")]
    NotActive { current: Mode, requested: Mode },

    #[error("Default mode is entered by leaving the active mode")]
    RestState,
}

/// Zentrale Modusverwaltung mit dem Zuweisungs-Stack
#[derive(Debug, Default)]
pub struct ModeMachine {
    current: Mode,
    stack: AssignmentStack,
    brake_bound: bool,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    pub fn is(&self, mode: Mode) -> bool {
        self.current == mode
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn brake_bound(&self) -> bool {
        self.brake_bound
    }

    /// Betritt `mode`, sofern `Default` aktiv ist; sichert vorher die Zuweisungen
    pub fn try_enter(&mut self, host: &mut dyn Host, mode: Mode) -> Result<(), ModeError> {
        if mode == Mode::Default {
            return Err(ModeError::RestState);
        }
        if self.current != Mode::Default {
            return Err(ModeError::Busy {
                current: self.current,
                requested: mode,
            });
        }

        if mode.saves_assignments() {
            self.stack.push(host);
        }
        self.current = mode;
        info!("Entered {} mode", mode);
        Ok(())
    }

    /// Verlässt `mode`, sofern genau dieser aktiv ist; stellt die Zuweisungen wieder her
    pub fn exit(&mut self, host: &mut dyn Host, mode: Mode) -> Result<(), ModeError> {
        if mode == Mode::Default {
            return Err(ModeError::RestState);
        }
        if self.current != mode {
            return Err(ModeError::NotActive {
                current: self.current,
                requested: mode,
            });
        }

        if mode.saves_assignments() {
            self.stack.pop(host);
        }
        self.current = Mode::Default;
        info!("Left {} mode", mode);
        Ok(())
    }

    /// Legt die Bremstaste temporär auf `command`
    ///
    /// Nur in `Default` erlaubt, damit der Bremsen-Schnappschuss nie zwischen
    /// einem Modus-Push und seinem Pop liegt.
    pub fn bind_brake(
        &mut self,
        host: &mut dyn Host,
        slot: Option<usize>,
        command: Option<CommandRef>,
    ) -> bool {
        if self.brake_bound || self.current != Mode::Default {
            return false;
        }

        self.stack.push(host);
        if let (Some(slot), Some(command)) = (slot, command) {
            host.write_button_assignments(slot, &[Some(command)]);
        }
        host.set_i32(datarefs::OVERRIDE_TOE_BRAKES, 1);
        self.brake_bound = true;
        debug!("Brake trigger engaged, toe brakes overridden");
        true
    }

    /// Gibt die Bremsen frei; nur in `Default`, sonst später erneut versuchen
    pub fn release_brake(&mut self, host: &mut dyn Host) -> bool {
        if !self.brake_bound || self.current != Mode::Default {
            return false;
        }

        clear_brakes(host);
        self.stack.pop(host);
        self.brake_bound = false;
        debug!("Brake trigger released");
        true
    }

    /// Erzwungene Rückkehr in den Ruhezustand
    ///
    /// Leert den Stack vollständig und gibt die Bremsen frei. Die
    /// modusspezifischen Aufräumarbeiten (Kamera, Force-Trim, Overlays)
    /// erledigt der Aufrufer vorher.
    pub fn force_rest(&mut self, host: &mut dyn Host) {
        if self.current != Mode::Default {
            info!("Forcing {} mode back to default", self.current);
        }
        if self.brake_bound {
            clear_brakes(host);
            self.brake_bound = false;
        }
        self.stack.drain(host);
        self.current = Mode::Default;
    }
}

fn clear_brakes(host: &mut dyn Host) {
    host.set_f32(datarefs::LEFT_BRAKE_RATIO, 0.0);
    host.set_f32(datarefs::RIGHT_BRAKE_RATIO, 0.0);
    host.set_i32(datarefs::OVERRIDE_TOE_BRAKES, 0);
}
