//! DualShock 4 touchpad as a pointer device
//!
//! Runs on its own `std::thread` because HID reads block. The thread only
//! talks to the OS through [`InputInjector`]; mode and assignment state stay
//! on the frame thread.

use crate::host::{InputInjector, MouseButton};
use hidapi::{HidApi, HidDevice};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const SONY_VENDOR_ID: u16 = 0x054c;
pub const DS4_PRODUCT_IDS: [u16; 3] = [0x05c4, 0x09cc, 0x0ba0];

const USB_REPORT_ID: u8 = 0x01;
const BT_REPORT_ID: u8 = 0x11;
const REPORT_LEN: usize = 64;
const READ_TIMEOUT_MS: i32 = 100;

// Offsets inside a USB input report
const CLICK_BYTE: usize = 7;
const FIRST_FINGER: usize = 35;
const SECOND_FINGER: usize = 39;

/// Touch units of vertical two-finger travel per scroll click
const SCROLL_STEP: i32 = 40;
/// Pointer pixels per touch unit
const POINTER_SCALE: f32 = 0.5;

#[derive(Debug, Error)]
pub enum TouchpadError {
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("No DualShock 4 found")]
    NotFound,

    #[error("Thread error: {0}")]
    Thread(String),
}

/// Blocking source of raw input reports
pub trait TouchpadSource: Send {
    /// Reads one report into `buf`, returning its length or 0 on timeout
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TouchpadError>;
}

pub struct HidTouchpad {
    device: HidDevice,
}

impl HidTouchpad {
    /// Opens the first DualShock 4 on the bus
    pub fn open() -> Result<Self, TouchpadError> {
        let api = HidApi::new()?;
        let info = api
            .device_list()
            .find(|d| d.vendor_id() == SONY_VENDOR_ID && DS4_PRODUCT_IDS.contains(&d.product_id()))
            .ok_or(TouchpadError::NotFound)?;

        info!(
            "Found DualShock 4 {:04x}:{:04x} at {:?}",
            info.vendor_id(),
            info.product_id(),
            info.path()
        );
        let device = info.open_device(&api)?;
        Ok(Self { device })
    }
}

impl TouchpadSource for HidTouchpad {
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TouchpadError> {
        Ok(self.device.read_timeout(buf, timeout_ms)?)
    }
}

/// Decoded touch state of one report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchFrame {
    pub fingers: [Option<(u16, u16)>; 2],
    pub click: bool,
}

impl TouchFrame {
    /// Decodes a USB (0x01) or Bluetooth (0x11) input report
    pub fn decode(report: &[u8]) -> Option<Self> {
        let shift = match report.first()? {
            &USB_REPORT_ID => 0,
            &BT_REPORT_ID => 2,
            _ => return None,
        };
        if report.len() < SECOND_FINGER + shift + 4 {
            return None;
        }

        let finger = |at: usize| {
            let b = &report[at + shift..at + shift + 4];
            // bit 7 set means no contact
            if b[0] & 0x80 != 0 {
                return None;
            }
            let x = u16::from(b[1]) | (u16::from(b[2] & 0x0f) << 8);
            let y = u16::from(b[2] >> 4) | (u16::from(b[3]) << 4);
            Some((x, y))
        };

        Some(Self {
            fingers: [finger(FIRST_FINGER), finger(SECOND_FINGER)],
            click: report[CLICK_BYTE + shift] & 0x02 != 0,
        })
    }
}

/// Turns consecutive touch frames into pointer actions
#[derive(Debug, Default)]
pub struct TouchTracker {
    last: Option<(u16, u16)>,
    scrolling: bool,
    scroll_travel: i32,
    pressed: bool,
}

impl TouchTracker {
    pub fn feed(&mut self, frame: TouchFrame, injector: &dyn InputInjector) {
        match frame.fingers {
            [Some(first), Some(_)] => {
                if let (Some(last), true) = (self.last, self.scrolling) {
                    self.scroll_travel += i32::from(last.1) - i32::from(first.1);
                    let clicks = self.scroll_travel / SCROLL_STEP;
                    if clicks != 0 {
                        injector.scroll(clicks);
                        self.scroll_travel -= clicks * SCROLL_STEP;
                    }
                }
                self.scrolling = true;
                self.last = Some(first);
            }
            [Some(first), None] => {
                if let (Some(last), false) = (self.last, self.scrolling) {
                    let dx = (f32::from(first.0) - f32::from(last.0)) * POINTER_SCALE;
                    let dy = (f32::from(first.1) - f32::from(last.1)) * POINTER_SCALE;
                    let (dx, dy) = (dx.round() as i32, dy.round() as i32);
                    if dx != 0 || dy != 0 {
                        injector.move_pointer(dx, dy);
                    }
                }
                self.scrolling = false;
                self.last = Some(first);
            }
            _ => {
                self.last = None;
                self.scrolling = false;
                self.scroll_travel = 0;
            }
        }

        if frame.click != self.pressed {
            injector.mouse_button(MouseButton::Left, frame.click);
            self.pressed = frame.click;
        }
    }

    /// Releases a click still held when the feed stops
    pub fn release(&mut self, injector: &dyn InputInjector) {
        if self.pressed {
            injector.mouse_button(MouseButton::Left, false);
            self.pressed = false;
        }
    }
}

/// Handle to the running touchpad thread
pub struct TouchpadFeed {
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TouchpadFeed {
    pub fn spawn<S>(source: S, injector: Arc<dyn InputInjector>) -> Result<Self, TouchpadError>
    where
        S: TouchpadSource + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let thread_shutdown = shutdown.clone();
        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name("touchpad".into())
            .spawn(move || {
                run_feed(source, injector.as_ref(), &thread_shutdown);
                thread_running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| TouchpadError::Thread(e.to_string()))?;

        info!("Touchpad feed started");
        Ok(Self {
            shutdown,
            running,
            handle: Some(handle),
        })
    }

    /// False once the thread has exited, e.g. after a read error
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Touchpad thread panicked");
            } else {
                info!("Touchpad feed stopped");
            }
        }
    }
}

impl Drop for TouchpadFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_feed<S: TouchpadSource>(mut source: S, injector: &dyn InputInjector, shutdown: &AtomicBool) {
    let mut buf = [0u8; REPORT_LEN];
    let mut tracker = TouchTracker::default();

    while !shutdown.load(Ordering::SeqCst) {
        match source.read_report(&mut buf, READ_TIMEOUT_MS) {
            Ok(0) => continue,
            Ok(len) => match TouchFrame::decode(&buf[..len]) {
                Some(frame) => tracker.feed(frame, injector),
                None => debug!("Ignoring report id {:#04x}", buf[0]),
            },
            Err(e) => {
                warn!("Touchpad read failed, stopping feed: {}", e);
                break;
            }
        }
    }
    tracker.release(injector);
}
