//! Modul für die Umsetzung von Controller-Eingaben in Simulator-Aktionen.
//!
//! Enthält die Modus-Zustandsmaschine mit ihrem Zuweisungs-Stack, die
//! Achsen-Engine mit Ansprechkurve und die Hilfen für Trimmung, lange
//! Tastendrücke und die Bildschirmtastatur.

pub mod assignments;
pub mod engine;
pub mod keyboard;
pub mod long_press;
pub mod modes;
pub mod response;
pub mod trim;

// Re-exports für einfacheren Zugriff
pub use assignments::{AssignmentSnapshot, AssignmentStack};
pub use engine::{AxisEngine, FrameInput};
pub use keyboard::OnScreenKeyboard;
pub use long_press::{LongPress, PressOutcome};
pub use modes::{Mode, ModeError, ModeMachine};
