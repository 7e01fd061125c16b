//! HID vocabulary shared by the descriptor compiler and the report encoder
//!
//! - `types`: profiles, special buttons, axes, simulation controls, modifiers
//! - `usage`: usage pages and usage codes
//! - `keymap`: keyboard usage codes and US-layout text mapping

pub mod keymap;
pub mod types;
pub mod usage;

pub use types::{
    hat, mouse_button, Axis, ControllerType, KeyboardModifiers, Profile, SimulationControl,
    SpecialButton,
};
