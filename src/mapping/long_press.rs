//! Unterscheidung kurzer und langer Tastendrücke
//!
//! Ein langer Druck löst seine Aktion genau einmal aus, sobald die Schwelle
//! während des Haltens überschritten wird; die kurze Aktion beim Loslassen
//! entfällt dann.

use crate::host::CommandPhase;

/// Schwelle in Sekunden Host-Laufzeit
pub const LONG_PRESS_SECONDS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    Pending,
    Short,
    Long,
}

#[derive(Debug, Default, Clone)]
pub struct LongPress {
    started: Option<f32>,
    fired: bool,
}

impl LongPress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verarbeitet eine Kommando-Phase zum Zeitpunkt `now`
    pub fn phase(&mut self, phase: CommandPhase, now: f32) -> PressOutcome {
        match phase {
            CommandPhase::Begin => {
                self.started = Some(now);
                self.fired = false;
                PressOutcome::Pending
            }
            CommandPhase::Continue => match self.started {
                Some(start) if !self.fired && now - start >= LONG_PRESS_SECONDS => {
                    self.fired = true;
                    PressOutcome::Long
                }
                _ => PressOutcome::Pending,
            },
            CommandPhase::End => {
                let outcome = match (self.started.take(), self.fired) {
                    (Some(_), false) => PressOutcome::Short,
                    _ => PressOutcome::Pending,
                };
                self.fired = false;
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_press_fires_on_end() {
        let mut press = LongPress::new();
        assert_eq!(press.phase(CommandPhase::Begin, 10.0), PressOutcome::Pending);
        assert_eq!(press.phase(CommandPhase::Continue, 10.5), PressOutcome::Pending);
        assert_eq!(press.phase(CommandPhase::End, 10.9), PressOutcome::Short);
    }

    #[test]
    fn test_long_press_fires_once_and_suppresses_short() {
        let mut press = LongPress::new();
        press.phase(CommandPhase::Begin, 3.0);
        assert_eq!(press.phase(CommandPhase::Continue, 4.0), PressOutcome::Long);
        assert_eq!(press.phase(CommandPhase::Continue, 4.5), PressOutcome::Pending);
        assert_eq!(press.phase(CommandPhase::Continue, 9.0), PressOutcome::Pending);
        assert_eq!(press.phase(CommandPhase::End, 9.1), PressOutcome::Pending);
    }

    #[test]
    fn test_end_without_begin_does_nothing() {
        let mut press = LongPress::new();
        assert_eq!(press.phase(CommandPhase::End, 1.0), PressOutcome::Pending);
    }
}
