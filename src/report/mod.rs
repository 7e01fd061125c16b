//! Report encoding
//!
//! Packs live input state into the fixed-layout payloads declared by the
//! compiled descriptor. Payloads never include the report id; the transport
//! attaches it per channel.

mod gamepad;
mod keyboard;
mod mouse;

pub use gamepad::GamepadState;
pub use keyboard::KeyboardReport;
pub use mouse::MouseReport;

use crate::config::GamepadConfig;
use crate::error::Result;
use crate::hid::SpecialButton;

/// Keyboard payload: modifiers, reserved byte, six key slots
pub const KEYBOARD_REPORT_LEN: usize = 8;
/// Mouse payload: buttons, x, y, wheel, horizontal pan
pub const MOUSE_REPORT_LEN: usize = 5;

/// Byte length of the gamepad payload for a configuration
pub fn gamepad_report_size(config: &GamepadConfig) -> usize {
    let motion_bytes = match (config.include_gyroscope, config.include_accelerometer) {
        (true, true) => 12,
        (true, false) | (false, true) => 6,
        (false, false) => 0,
    };

    config.button_bytes()
        + config.special_button_bytes()
        + 2 * config.axis_count() as usize
        + 2 * config.simulation_count() as usize
        + motion_bytes
        + config.hat_switch_count as usize
}

/// Bit position of a special button inside the packed special-button byte
///
/// Positions are dense: only enabled buttons with a lower logical index
/// count, in the same order the descriptor lists their usages.
pub fn special_button_bit_position(config: &GamepadConfig, index: u8) -> Result<u8> {
    let button = SpecialButton::from_index(index)?;
    let position = config
        .enabled_special_buttons()
        .take_while(|enabled| enabled.index() < button.index())
        .count();
    Ok(position as u8)
}

/// One field of the gamepad payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    /// Byte offset inside the payload
    pub offset: usize,
    pub len: usize,
}

/// Byte layout of the gamepad payload, in packing order
pub fn gamepad_layout(config: &GamepadConfig) -> Vec<FieldLayout> {
    let mut fields = Vec::new();
    let mut offset = 0;
    let mut push = |name: String, len: usize| {
        fields.push(FieldLayout { name, offset, len });
        offset += len;
    };

    if config.button_count > 0 {
        push(format!("buttons[1..={}]", config.button_count), config.button_bytes());
    }
    if config.total_special_button_count() > 0 {
        let names: Vec<_> = config
            .enabled_special_buttons()
            .map(|button| button.name())
            .collect();
        push(format!("special[{}]", names.join(",")), config.special_button_bytes());
    }
    for axis in config.enabled_axes() {
        push(axis.name().to_string(), 2);
    }
    for control in config.enabled_simulation() {
        push(control.name().to_string(), 2);
    }
    if config.include_gyroscope {
        push("gyroscope".to_string(), 6);
    }
    if config.include_accelerometer {
        push("accelerometer".to_string(), 6);
    }
    for hat in (0..config.hat_switch_count).rev() {
        push(format!("hat{}", hat), 1);
    }

    fields
}

/// Keep 16-bit inputs inside the symmetric range `-32767..=32767`
pub fn clamp_axis(value: i16) -> i16 {
    value.max(-i16::MAX)
}
