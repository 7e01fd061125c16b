//! ble-controller - BLE HID gamepad, keyboard and mouse
//!
//! Compiles a capability configuration into one HID report descriptor,
//! encodes live input state into the matching fixed-layout reports, and
//! drives an external BLE stack through the [`transport::HidTransport`] seam.

pub mod config;
pub mod connection;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod hid;
pub mod pairing;
pub mod report;
pub mod transport;

pub use controller::BleController;
pub use error::{ControllerError, Result};
