//! Gamepad input state and payload packing
//!
//! Packing order mirrors the descriptor:
//!   buttons -> special buttons -> axes -> simulation -> gyroscope
//!   -> accelerometer -> hats (last hat first)

use super::{clamp_axis, gamepad_report_size, special_button_bit_position};
use crate::config::{GamepadConfig, MAX_BUTTONS, MAX_HAT_SWITCHES};
use crate::error::{ControllerError, Result};
use crate::hid::{Axis, SimulationControl, SpecialButton};

const BUTTON_BYTES: usize = MAX_BUTTONS as usize / 8;

/// Live gamepad state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GamepadState {
    /// Bit `i` is button `i + 1`
    buttons: [u8; BUTTON_BYTES],
    /// Packed special buttons, dense positions
    special: u8,
    /// Indexed by `Axis::index`
    axes: [i16; 8],
    /// Indexed by `SimulationControl::index`
    simulation: [i16; 5],
    gyroscope: [i16; 3],
    accelerometer: [i16; 3],
    hats: [i8; MAX_HAT_SWITCHES as usize],
}

impl GamepadState {
    pub fn new() -> Self {
        Self::default()
    }

    fn button_slot(config: &GamepadConfig, button: u8) -> Result<(usize, u8)> {
        if button == 0 || button > config.button_count {
            return Err(ControllerError::InvalidButton(button));
        }
        let bit = (button - 1) as usize;
        Ok((bit / 8, 1 << (bit % 8)))
    }

    /// Press an ordinary button (1-based)
    pub fn press(&mut self, config: &GamepadConfig, button: u8) -> Result<()> {
        let (index, mask) = Self::button_slot(config, button)?;
        self.buttons[index] |= mask;
        Ok(())
    }

    /// Release an ordinary button (1-based)
    pub fn release(&mut self, config: &GamepadConfig, button: u8) -> Result<()> {
        let (index, mask) = Self::button_slot(config, button)?;
        self.buttons[index] &= !mask;
        Ok(())
    }

    pub fn is_pressed(&self, config: &GamepadConfig, button: u8) -> bool {
        Self::button_slot(config, button)
            .map(|(index, mask)| self.buttons[index] & mask != 0)
            .unwrap_or(false)
    }

    /// Clear every ordinary button
    pub fn reset_buttons(&mut self) {
        self.buttons = [0; BUTTON_BYTES];
    }

    /// Set or clear a special button; returns false if it is not enabled
    pub fn set_special(
        &mut self,
        config: &GamepadConfig,
        button: SpecialButton,
        pressed: bool,
    ) -> Result<bool> {
        if !config.special_buttons.is_enabled(button) {
            return Ok(false);
        }
        let mask = 1u8 << special_button_bit_position(config, button as u8)?;
        if pressed {
            self.special |= mask;
        } else {
            self.special &= !mask;
        }
        Ok(true)
    }

    pub fn special_bits(&self) -> u8 {
        self.special
    }

    pub fn set_axis(&mut self, axis: Axis, value: i16) {
        self.axes[axis.index()] = clamp_axis(value);
    }

    pub fn axis(&self, axis: Axis) -> i16 {
        self.axes[axis.index()]
    }

    pub fn set_simulation(&mut self, control: SimulationControl, value: i16) {
        self.simulation[control.index()] = clamp_axis(value);
    }

    pub fn simulation(&self, control: SimulationControl) -> i16 {
        self.simulation[control.index()]
    }

    pub fn set_gyroscope(&mut self, values: [i16; 3]) {
        self.gyroscope = values.map(clamp_axis);
    }

    pub fn set_accelerometer(&mut self, values: [i16; 3]) {
        self.accelerometer = values.map(clamp_axis);
    }

    /// Set hat `index` (0-based); out-of-range indices are ignored
    pub fn set_hat(&mut self, index: usize, value: i8) {
        if let Some(hat) = self.hats.get_mut(index) {
            *hat = value;
        }
    }

    pub fn hat(&self, index: usize) -> Option<i8> {
        self.hats.get(index).copied()
    }

    /// Pack the state into the configured gamepad payload
    pub fn encode(&self, config: &GamepadConfig) -> Vec<u8> {
        let mut report = Vec::with_capacity(gamepad_report_size(config));

        let button_bytes = config.button_bytes().min(BUTTON_BYTES);
        report.extend_from_slice(&self.buttons[..button_bytes]);

        if config.total_special_button_count() > 0 {
            report.push(self.special);
        }

        for axis in config.enabled_axes() {
            report.extend_from_slice(&self.axis(axis).to_le_bytes());
        }

        for control in config.enabled_simulation() {
            report.extend_from_slice(&self.simulation(control).to_le_bytes());
        }

        if config.include_gyroscope {
            for value in self.gyroscope {
                report.extend_from_slice(&value.to_le_bytes());
            }
        }

        if config.include_accelerometer {
            for value in self.accelerometer {
                report.extend_from_slice(&value.to_le_bytes());
            }
        }

        let hat_count = (config.hat_switch_count as usize).min(self.hats.len());
        for hat in self.hats[..hat_count].iter().rev() {
            report.push(*hat as u8);
        }

        debug_assert_eq!(report.len(), gamepad_report_size(config));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisFlags;

    fn ten_buttons_xy_one_hat() -> GamepadConfig {
        let mut config = GamepadConfig::default();
        config.button_count = 10;
        config.axes = AxisFlags::all(false);
        config.axes.x = true;
        config.axes.y = true;
        config.hat_switch_count = 1;
        config
    }

    #[test]
    fn test_end_to_end_layout() {
        let config = ten_buttons_xy_one_hat();
        let mut state = GamepadState::new();
        state.press(&config, 3).unwrap();
        state.press(&config, 10).unwrap();
        state.set_axis(Axis::X, 100);
        state.set_axis(Axis::Y, -100);
        state.set_hat(0, 5);

        assert_eq!(
            state.encode(&config),
            vec![0b0000_0100, 0b0000_0010, 0x64, 0x00, 0x9C, 0xFF, 5]
        );
    }

    #[test]
    fn test_press_release_and_bounds() {
        let config = ten_buttons_xy_one_hat();
        let mut state = GamepadState::new();

        state.press(&config, 1).unwrap();
        assert!(state.is_pressed(&config, 1));
        state.release(&config, 1).unwrap();
        assert!(!state.is_pressed(&config, 1));

        assert!(matches!(
            state.press(&config, 0),
            Err(ControllerError::InvalidButton(0))
        ));
        assert!(matches!(
            state.press(&config, 11),
            Err(ControllerError::InvalidButton(11))
        ));
        assert!(!state.is_pressed(&config, 11));
    }

    #[test]
    fn test_reset_buttons_keeps_axes() {
        let config = ten_buttons_xy_one_hat();
        let mut state = GamepadState::new();
        state.press(&config, 2).unwrap();
        state.set_axis(Axis::X, 7);
        state.reset_buttons();
        assert!(!state.is_pressed(&config, 2));
        assert_eq!(state.axis(Axis::X), 7);
    }

    #[test]
    fn test_sentinel_clamp_on_the_wire() {
        let mut config = GamepadConfig::default();
        config.button_count = 0;
        config.hat_switch_count = 0;
        config.axes = AxisFlags::all(false);
        config.axes.rz = true;
        config.simulation.brake = true;
        config.include_gyroscope = true;

        let mut min = GamepadState::new();
        min.set_axis(Axis::Rz, i16::MIN);
        min.set_simulation(SimulationControl::Brake, i16::MIN);
        min.set_gyroscope([i16::MIN, 0, i16::MIN]);

        let mut min_plus_one = GamepadState::new();
        min_plus_one.set_axis(Axis::Rz, i16::MIN + 1);
        min_plus_one.set_simulation(SimulationControl::Brake, i16::MIN + 1);
        min_plus_one.set_gyroscope([i16::MIN + 1, 0, i16::MIN + 1]);

        let encoded = min.encode(&config);
        assert_eq!(encoded, min_plus_one.encode(&config));
        assert_eq!(&encoded[..2], &[0x01, 0x80]);
    }

    #[test]
    fn test_axes_packed_in_report_order() {
        let mut config = GamepadConfig::default();
        config.button_count = 0;
        config.hat_switch_count = 0;
        config.axes = AxisFlags::all(false);
        config.axes.rx = true;
        config.axes.rz = true;

        let mut state = GamepadState::new();
        state.set_axis(Axis::Rx, 1);
        state.set_axis(Axis::Rz, 2);
        // Disabled axes never reach the wire
        state.set_axis(Axis::Y, 3);

        assert_eq!(state.encode(&config), vec![0x02, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_hats_reversed() {
        let mut config = ten_buttons_xy_one_hat();
        config.button_count = 0;
        config.axes = AxisFlags::all(false);
        config.hat_switch_count = 2;

        let mut state = GamepadState::new();
        state.set_hat(0, 3);
        state.set_hat(1, 7);
        assert_eq!(state.encode(&config), vec![7, 3]);
    }

    #[test]
    fn test_special_buttons_dense_bits() {
        let mut config = ten_buttons_xy_one_hat();
        config.special_buttons.select = true;
        config.special_buttons.home = true;

        let mut state = GamepadState::new();
        assert!(state.set_special(&config, SpecialButton::Home, true).unwrap());
        assert_eq!(state.special_bits(), 0b10);
        assert!(state.set_special(&config, SpecialButton::Select, true).unwrap());
        assert_eq!(state.special_bits(), 0b11);
        // Disabled buttons own no bit
        assert!(!state.set_special(&config, SpecialButton::Start, true).unwrap());
        assert_eq!(state.special_bits(), 0b11);

        let encoded = state.encode(&config);
        assert_eq!(encoded.len(), 2 + 1 + 4 + 1);
        assert_eq!(encoded[2], 0b11);
    }

    #[test]
    fn test_motion_blocks() {
        let mut config = GamepadConfig::default();
        config.button_count = 0;
        config.hat_switch_count = 0;
        config.axes = AxisFlags::all(false);
        config.include_gyroscope = true;
        config.include_accelerometer = true;

        let mut state = GamepadState::new();
        state.set_gyroscope([1, 2, 3]);
        state.set_accelerometer([-1, -2, -3]);
        assert_eq!(
            state.encode(&config),
            vec![1, 0, 2, 0, 3, 0, 0xFF, 0xFF, 0xFE, 0xFF, 0xFD, 0xFF]
        );
    }
}
