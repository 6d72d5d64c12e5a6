//! gilrs reader for the bench binary
//!
//! Translates gamepad events into the raw value conventions the simulator
//! uses (sticks 0..1 with up = 0, triggers between the profile's endpoints)
//! and publishes the latest state through a watch channel.

use chrono::{DateTime, Local};
use flightpad::controller::profile::{AxisRole, BrakeTrigger, ButtonRole, ControllerProfile};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Latest gamepad state keyed by role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadSnapshot {
    /// Raw host values
    pub axes: HashMap<AxisRole, f32>,
    pub buttons: HashSet<ButtonRole>,
    pub updated: Option<DateTime<Local>>,
}

impl PadSnapshot {
    /// Centred sticks and released triggers
    pub fn at_rest(trigger: BrakeTrigger) -> Self {
        let mut snapshot = Self::default();
        for role in AxisRole::ALL {
            let value = match role {
                AxisRole::LeftTrigger | AxisRole::RightTrigger => trigger.released,
                _ => 0.5,
            };
            snapshot.axes.insert(role, value);
        }
        snapshot
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Failed to initialize gamepad reader: {0}")]
    Initialization(String),

    #[error("Failed to spawn reader thread: {0}")]
    Thread(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum ReaderState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct GamepadReader<S: ReaderState> {
    gilrs: Gilrs,

    // Only events from this pad are used
    active_gamepad: Option<GamepadId>,

    trigger: BrakeTrigger,
    snapshot: PadSnapshot,
    sender: watch::Sender<PadSnapshot>,
}

impl GamepadReader<Initializing> {
    pub fn create(
        profile: &'static ControllerProfile,
        sender: watch::Sender<PadSnapshot>,
    ) -> Result<Self, ReaderError> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new().map_err(|e| {
            error!("Failed to initialize gilrs: {}", e);
            ReaderError::Initialization(e.to_string())
        })?;

        let trigger = profile.brake_trigger;
        Ok(Self::new(
            gilrs,
            None,
            trigger,
            PadSnapshot::at_rest(trigger),
            sender,
        ))
    }

    /// Picks the first connected pad and starts collecting
    pub fn initialize(mut self) -> GamepadReader<Collecting> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        match gamepads.first() {
            Some((id, gamepad)) => {
                info!("Using gamepad: {} ({})", gamepad.name(), id);
                self.active_gamepad = Some(*id);
            }
            None => warn!("No gamepad connected, waiting for one"),
        }

        self.sender.send_replace(self.snapshot.clone());
        self.transition()
    }
}

impl GamepadReader<Collecting> {
    /// Drains pending gilrs events; true if the snapshot changed
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match self.active_gamepad {
                Some(active) if active != id => continue,
                None => {
                    info!("Gamepad {} connected", id);
                    self.active_gamepad = Some(id);
                }
                _ => {}
            }
            changed |= self.apply(event);
        }

        if changed {
            self.snapshot.updated = Some(Local::now());
            self.sender.send_replace(self.snapshot.clone());
        }
        changed
    }

    fn apply(&mut self, event: EventType) -> bool {
        match event {
            EventType::ButtonPressed(button, _) => match map_button(button) {
                Some(role) => self.snapshot.buttons.insert(role),
                None => false,
            },
            EventType::ButtonReleased(button, _) => match map_button(button) {
                Some(role) => self.snapshot.buttons.remove(&role),
                None => false,
            },
            EventType::ButtonChanged(Button::LeftTrigger2, value, _) => {
                self.set_axis(AxisRole::LeftTrigger, trigger_to_raw(value, self.trigger))
            }
            EventType::ButtonChanged(Button::RightTrigger2, value, _) => {
                self.set_axis(AxisRole::RightTrigger, trigger_to_raw(value, self.trigger))
            }
            EventType::AxisChanged(axis, value, _) => match map_axis(axis) {
                Some(role @ (AxisRole::LeftTrigger | AxisRole::RightTrigger)) => {
                    self.set_axis(role, trigger_to_raw(value, self.trigger))
                }
                Some(role) => self.set_axis(role, stick_to_raw(role, value)),
                None => false,
            },
            EventType::Disconnected => {
                warn!("Gamepad disconnected, releasing all inputs");
                self.active_gamepad = None;
                self.snapshot = PadSnapshot::at_rest(self.trigger);
                true
            }
            _ => false,
        }
    }

    fn set_axis(&mut self, role: AxisRole, value: f32) -> bool {
        self.snapshot.axes.insert(role, value) != Some(value)
    }

    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!("Starting gamepad read loop");

        let mut updates = 0u32;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);

        while !shutdown.load(Ordering::SeqCst) {
            if self.poll() {
                updates += 1;
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                debug!(
                    "Gamepad reader stats: {} updates in last {} seconds",
                    updates,
                    log_interval.num_seconds()
                );
                updates = 0;
                last_log_time = now;
            }

            thread::sleep(Duration::from_millis(1));
        }
        info!("Gamepad read loop stopped");
    }
}

/// Owns the reader thread
pub struct GamepadHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl GamepadHandle {
    pub fn spawn(
        profile: &'static ControllerProfile,
        sender: watch::Sender<PadSnapshot>,
    ) -> Result<Self, ReaderError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = shutdown.clone();

        // gilrs is created on the reader thread itself
        let handle = thread::Builder::new()
            .name("gamepad".into())
            .spawn(move || match GamepadReader::<Initializing>::create(profile, sender) {
                Ok(reader) => reader.initialize().run(&thread_shutdown),
                Err(e) => error!("Gamepad reader not started: {}", e),
            })
            .map_err(|e| ReaderError::Thread(e.to_string()))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }
}

impl Drop for GamepadHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Gamepad reader thread panicked");
            }
        }
    }
}

fn map_button(button: Button) -> Option<ButtonRole> {
    match button {
        Button::South => Some(ButtonRole::FaceDown),
        Button::East => Some(ButtonRole::FaceRight),
        Button::West => Some(ButtonRole::FaceLeft),
        Button::North => Some(ButtonRole::FaceUp),
        Button::Select => Some(ButtonRole::CenterLeft),
        Button::Start => Some(ButtonRole::CenterRight),
        Button::LeftTrigger => Some(ButtonRole::BumperLeft),
        Button::RightTrigger => Some(ButtonRole::BumperRight),
        Button::LeftThumb => Some(ButtonRole::StickLeft),
        Button::RightThumb => Some(ButtonRole::StickRight),
        Button::DPadUp => Some(ButtonRole::DpadUp),
        Button::DPadDown => Some(ButtonRole::DpadDown),
        Button::DPadLeft => Some(ButtonRole::DpadLeft),
        Button::DPadRight => Some(ButtonRole::DpadRight),
        _ => None,
    }
}

fn map_axis(axis: Axis) -> Option<AxisRole> {
    match axis {
        Axis::LeftStickX => Some(AxisRole::LeftX),
        Axis::LeftStickY => Some(AxisRole::LeftY),
        Axis::RightStickX => Some(AxisRole::RightX),
        Axis::RightStickY => Some(AxisRole::RightY),
        Axis::LeftZ => Some(AxisRole::LeftTrigger),
        Axis::RightZ => Some(AxisRole::RightTrigger),
        _ => None,
    }
}

/// gilrs reports -1..1 with up positive; the host wants 0..1 with up at 0
fn stick_to_raw(role: AxisRole, value: f32) -> f32 {
    let value = value.clamp(-1.0, 1.0);
    match role {
        AxisRole::LeftY | AxisRole::RightY => (1.0 - value) / 2.0,
        _ => (value + 1.0) / 2.0,
    }
}

fn trigger_to_raw(value: f32, trigger: BrakeTrigger) -> f32 {
    let pulled = value.clamp(0.0, 1.0);
    trigger.released + pulled * (trigger.pressed - trigger.released)
}
