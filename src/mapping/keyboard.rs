//! Bildschirmtastatur
//!
//! Ein Selektor wandert mit dem D-Pad über ein festes QWERTY-Layout. Die
//! Tastencodes sind USB-HID-Usages der Keyboard-Page; was der Injector daraus
//! macht, ist Sache der Plattform.

use crate::host::InputInjector;
use tracing::debug;

/// Breite einer normalen Taste in Layout-Einheiten
pub const UNIT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Up,
    Down,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardKey {
    pub label: &'static str,
    pub code: u32,
    /// Breite in Layout-Einheiten (normale Taste = [`UNIT`])
    pub width: u8,
    pub state: KeyState,
    /// Modifikatoren lassen sich einrasten
    pub lockable: bool,
}

impl KeyboardKey {
    const fn key(label: &'static str, code: u32) -> Self {
        Self::wide(label, code, UNIT)
    }

    const fn wide(label: &'static str, code: u32, width: u8) -> Self {
        Self {
            label,
            code,
            width,
            state: KeyState::Up,
            lockable: false,
        }
    }

    const fn modifier(label: &'static str, code: u32, width: u8) -> Self {
        Self {
            label,
            code,
            width,
            state: KeyState::Up,
            lockable: true,
        }
    }
}

/// Tastenlayout mit Selektor
#[derive(Debug, Clone)]
pub struct OnScreenKeyboard {
    rows: Vec<Vec<KeyboardKey>>,
    row: usize,
    column: usize,
    // Taste, die beim letzten Druck heruntergegangen ist
    pressed: Option<(usize, usize)>,
}

impl Default for OnScreenKeyboard {
    fn default() -> Self {
        Self::qwerty()
    }
}

impl OnScreenKeyboard {
    pub fn qwerty() -> Self {
        use KeyboardKey as K;

        let rows = vec![
            vec![
                K::key("Esc", 0x29),
                K::key("1", 0x1e),
                K::key("2", 0x1f),
                K::key("3", 0x20),
                K::key("4", 0x21),
                K::key("5", 0x22),
                K::key("6", 0x23),
                K::key("7", 0x24),
                K::key("8", 0x25),
                K::key("9", 0x26),
                K::key("0", 0x27),
                K::key("-", 0x2d),
                K::key("=", 0x2e),
                K::wide("Bksp", 0x2a, 4),
            ],
            vec![
                K::wide("Tab", 0x2b, 3),
                K::key("Q", 0x14),
                K::key("W", 0x1a),
                K::key("E", 0x08),
                K::key("R", 0x15),
                K::key("T", 0x17),
                K::key("Y", 0x1c),
                K::key("U", 0x18),
                K::key("I", 0x0c),
                K::key("O", 0x12),
                K::key("P", 0x13),
                K::key("[", 0x2f),
                K::key("]", 0x30),
                K::wide("\\", 0x31, 3),
            ],
            vec![
                K::modifier("Ctrl", 0xe0, 4),
                K::key("A", 0x04),
                K::key("S", 0x16),
                K::key("D", 0x07),
                K::key("F", 0x09),
                K::key("G", 0x0a),
                K::key("H", 0x0b),
                K::key("J", 0x0d),
                K::key("K", 0x0e),
                K::key("L", 0x0f),
                K::key(";", 0x33),
                K::key("'", 0x34),
                K::wide("Enter", 0x28, 4),
            ],
            vec![
                K::modifier("Shift", 0xe1, 5),
                K::key("Z", 0x1d),
                K::key("X", 0x1b),
                K::key("C", 0x06),
                K::key("V", 0x19),
                K::key("B", 0x05),
                K::key("N", 0x11),
                K::key("M", 0x10),
                K::key(",", 0x36),
                K::key(".", 0x37),
                K::key("/", 0x38),
                K::modifier("Shift", 0xe5, 5),
            ],
            vec![
                K::modifier("Alt", 0xe2, 4),
                K::key("`", 0x35),
                K::wide("Space", 0x2c, 16),
                K::key("←", 0x50),
                K::key("↓", 0x51),
                K::key("↑", 0x52),
                K::key("→", 0x4f),
            ],
        ];

        Self {
            rows,
            row: 0,
            column: 0,
            pressed: None,
        }
    }

    pub fn rows(&self) -> &[Vec<KeyboardKey>] {
        &self.rows
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    pub fn selected(&self) -> &KeyboardKey {
        &self.rows[self.row][self.column]
    }

    /// Bewegt den Selektor; an den Rändern wird umgebrochen
    pub fn move_selection(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                let len = self.rows[self.row].len();
                self.column = (self.column + len - 1) % len;
            }
            Direction::Right => {
                let len = self.rows[self.row].len();
                self.column = (self.column + 1) % len;
            }
            Direction::Up | Direction::Down => {
                let center = self.key_center(self.row, self.column);
                let rows = self.rows.len();
                self.row = if direction == Direction::Up {
                    (self.row + rows - 1) % rows
                } else {
                    (self.row + 1) % rows
                };
                self.column = self.column_at(self.row, center);
            }
        }
        debug!("Keyboard selector on {}", self.selected().label);
    }

    /// Mitte einer Taste in doppelten Layout-Einheiten
    fn key_center(&self, row: usize, column: usize) -> u32 {
        let start: u32 = self.rows[row][..column]
            .iter()
            .map(|k| u32::from(k.width))
            .sum();
        start * 2 + u32::from(self.rows[row][column].width)
    }

    /// Taste in `row`, deren Spanne die Position `center` enthält
    fn column_at(&self, row: usize, center: u32) -> usize {
        let mut end = 0;
        for (column, key) in self.rows[row].iter().enumerate() {
            end += u32::from(key.width) * 2;
            if center < end {
                return column;
            }
        }
        self.rows[row].len() - 1
    }

    /// Drückt die ausgewählte Taste oder löst die zuletzt gedrückte
    ///
    /// Eine eingerastete Taste bleibt unverändert.
    pub fn press(&mut self, injector: &dyn InputInjector, down: bool) {
        if down {
            let (row, column) = (self.row, self.column);
            let key = &mut self.rows[row][column];
            if key.state == KeyState::Up {
                injector.key(key.code, true);
                key.state = KeyState::Down;
                self.pressed = Some((row, column));
            }
        } else if let Some((row, column)) = self.pressed.take() {
            let key = &mut self.rows[row][column];
            if key.state == KeyState::Down {
                injector.key(key.code, false);
                key.state = KeyState::Up;
            }
        }
    }

    /// Rastet einen Modifikator ein oder aus
    pub fn toggle_lock(&mut self, injector: &dyn InputInjector) {
        let key = &mut self.rows[self.row][self.column];
        if !key.lockable {
            return;
        }
        match key.state {
            KeyState::Locked => {
                injector.key(key.code, false);
                key.state = KeyState::Up;
            }
            KeyState::Up => {
                injector.key(key.code, true);
                key.state = KeyState::Locked;
            }
            KeyState::Down => key.state = KeyState::Locked,
        }
        debug!("{} is now {:?}", key.label, key.state);
    }

    /// Löst alle gedrückten und eingerasteten Tasten
    pub fn release_all(&mut self, injector: &dyn InputInjector) {
        for key in self.rows.iter_mut().flatten() {
            if key.state != KeyState::Up {
                injector.key(key.code, false);
                key.state = KeyState::Up;
            }
        }
        self.pressed = None;
    }

    pub fn held_keys(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|k| k.state != KeyState::Up)
            .count()
    }
}
