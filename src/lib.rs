//! Gamepad control for flight simulation
//!
//! Turns a standard Xbox or PlayStation controller into a usable flight
//! controller: modifier buttons temporarily repurpose sticks and buttons for
//! throttle, propeller, mixture, cowl flaps, view, trim, pointer emulation and
//! an on-screen keyboard. Every temporary rebinding is undone exactly when the
//! modifier is released.
//!
//! The simulator is reached only through [`host::Host`]; [`plugin::Plugin`]
//! is the lifecycle entry point.

pub mod commands;
pub mod config;
pub mod controller;
pub mod host;
pub mod mapping;
pub mod plugin;
pub mod session;

pub use plugin::Plugin;
pub use session::Session;
