use serde::{Deserialize, Serialize};

use crate::error::{ControllerError, Result};
use crate::hid::{Axis, ControllerType, Profile, SimulationControl, SpecialButton};

/// Most simultaneous non-modifier keys a keyboard report can carry
pub const MAX_KEYBOARD_KEYS: u8 = 6;
/// Most buttons the mouse bitmap can carry
pub const MAX_MOUSE_BUTTONS: u8 = 8;
/// Most ordinary gamepad buttons
pub const MAX_BUTTONS: u8 = 128;
/// Most hat switches
pub const MAX_HAT_SWITCHES: u8 = 4;

/// Report ids used when the configuration does not override them
pub const GAMEPAD_REPORT_ID: u8 = 0x01;
pub const KEYBOARD_REPORT_ID: u8 = 0x02;
pub const MOUSE_REPORT_ID: u8 = 0x03;

/// Controller configuration
///
/// Assembled once by the caller; the controller keeps an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Which reports the descriptor declares
    pub profiles: ProfileSet,
    /// Transmit after every state change instead of waiting for a flush
    pub auto_report: bool,
    /// Gamepad capabilities
    pub gamepad: GamepadConfig,
    /// Keyboard capabilities
    pub keyboard: KeyboardConfig,
    /// Mouse capabilities
    pub mouse: MouseConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            profiles: ProfileSet::default(),
            auto_report: true,
            gamepad: GamepadConfig::default(),
            keyboard: KeyboardConfig::default(),
            mouse: MouseConfig::default(),
        }
    }
}

/// Enabled profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSet {
    pub gamepad: bool,
    pub keyboard: bool,
    pub mouse: bool,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self {
            gamepad: true,
            keyboard: true,
            mouse: true,
        }
    }
}

impl ProfileSet {
    pub fn only(profile: Profile) -> Self {
        let mut set = Self {
            gamepad: false,
            keyboard: false,
            mouse: false,
        };
        set.set(profile, true);
        set
    }

    pub fn contains(&self, profile: Profile) -> bool {
        match profile {
            Profile::Gamepad => self.gamepad,
            Profile::Keyboard => self.keyboard,
            Profile::Mouse => self.mouse,
        }
    }

    pub fn set(&mut self, profile: Profile, enabled: bool) {
        match profile {
            Profile::Gamepad => self.gamepad = enabled,
            Profile::Keyboard => self.keyboard = enabled,
            Profile::Mouse => self.mouse = enabled,
        }
    }

    /// Enabled profiles in descriptor order
    pub fn iter(&self) -> impl Iterator<Item = Profile> + '_ {
        Profile::ALL.into_iter().filter(|p| self.contains(*p))
    }
}

/// Special button enable flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialButtonFlags {
    pub start: bool,
    pub select: bool,
    pub menu: bool,
    pub home: bool,
    pub back: bool,
    pub volume_inc: bool,
    pub volume_dec: bool,
    pub volume_mute: bool,
}

impl SpecialButtonFlags {
    /// Flags indexed by logical special-button index
    pub fn as_array(&self) -> [bool; 8] {
        [
            self.start,
            self.select,
            self.menu,
            self.home,
            self.back,
            self.volume_inc,
            self.volume_dec,
            self.volume_mute,
        ]
    }

    pub fn is_enabled(&self, button: SpecialButton) -> bool {
        self.as_array()[button.index()]
    }

    pub fn set(&mut self, button: SpecialButton, enabled: bool) {
        let flag = match button {
            SpecialButton::Start => &mut self.start,
            SpecialButton::Select => &mut self.select,
            SpecialButton::Menu => &mut self.menu,
            SpecialButton::Home => &mut self.home,
            SpecialButton::Back => &mut self.back,
            SpecialButton::VolumeInc => &mut self.volume_inc,
            SpecialButton::VolumeDec => &mut self.volume_dec,
            SpecialButton::VolumeMute => &mut self.volume_mute,
        };
        *flag = enabled;
    }
}

/// Axis enable flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisFlags {
    pub x: bool,
    pub y: bool,
    pub z: bool,
    pub rx: bool,
    pub ry: bool,
    pub rz: bool,
    pub slider1: bool,
    pub slider2: bool,
}

impl Default for AxisFlags {
    fn default() -> Self {
        Self::all(true)
    }
}

impl AxisFlags {
    pub fn all(enabled: bool) -> Self {
        Self {
            x: enabled,
            y: enabled,
            z: enabled,
            rx: enabled,
            ry: enabled,
            rz: enabled,
            slider1: enabled,
            slider2: enabled,
        }
    }

    pub fn is_enabled(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::Rx => self.rx,
            Axis::Ry => self.ry,
            Axis::Rz => self.rz,
            Axis::Slider1 => self.slider1,
            Axis::Slider2 => self.slider2,
        }
    }

    pub fn set(&mut self, axis: Axis, enabled: bool) {
        let flag = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::Rx => &mut self.rx,
            Axis::Ry => &mut self.ry,
            Axis::Rz => &mut self.rz,
            Axis::Slider1 => &mut self.slider1,
            Axis::Slider2 => &mut self.slider2,
        };
        *flag = enabled;
    }
}

/// Simulation control enable flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationFlags {
    pub rudder: bool,
    pub throttle: bool,
    pub accelerator: bool,
    pub brake: bool,
    pub steering: bool,
}

impl SimulationFlags {
    pub fn is_enabled(&self, control: SimulationControl) -> bool {
        match control {
            SimulationControl::Rudder => self.rudder,
            SimulationControl::Throttle => self.throttle,
            SimulationControl::Accelerator => self.accelerator,
            SimulationControl::Brake => self.brake,
            SimulationControl::Steering => self.steering,
        }
    }

    pub fn set(&mut self, control: SimulationControl, enabled: bool) {
        let flag = match control {
            SimulationControl::Rudder => &mut self.rudder,
            SimulationControl::Throttle => &mut self.throttle,
            SimulationControl::Accelerator => &mut self.accelerator,
            SimulationControl::Brake => &mut self.brake,
            SimulationControl::Steering => &mut self.steering,
        };
        *flag = enabled;
    }
}

/// Inclusive logical range of a group of 16-bit fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicalRange {
    pub min: i16,
    pub max: i16,
}

impl Default for LogicalRange {
    fn default() -> Self {
        Self {
            min: 0x0000,
            max: 0x7FFF,
        }
    }
}

/// Gamepad configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadConfig {
    /// Usage of the application collection
    pub controller_type: ControllerType,
    pub report_id: u8,
    /// Ordinary buttons (0..=128)
    pub button_count: u8,
    /// Hat switches (0..=4)
    pub hat_switch_count: u8,
    pub special_buttons: SpecialButtonFlags,
    pub axes: AxisFlags,
    pub simulation: SimulationFlags,
    pub include_gyroscope: bool,
    pub include_accelerometer: bool,
    pub axes_range: LogicalRange,
    pub simulation_range: LogicalRange,
    pub motion_range: LogicalRange,
    /// Declare a vendor-defined output report
    pub output_report: bool,
    /// Output report size in bytes
    pub output_report_length: u16,
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            controller_type: ControllerType::Gamepad,
            report_id: GAMEPAD_REPORT_ID,
            button_count: 16,
            hat_switch_count: 1,
            special_buttons: SpecialButtonFlags::default(),
            axes: AxisFlags::default(),
            simulation: SimulationFlags::default(),
            include_gyroscope: false,
            include_accelerometer: false,
            axes_range: LogicalRange::default(),
            simulation_range: LogicalRange::default(),
            motion_range: LogicalRange::default(),
            output_report: false,
            output_report_length: 64,
        }
    }
}

/// Bits needed to round `count` one-bit fields up to a whole byte
pub fn padding_bits(count: usize) -> u8 {
    ((8 - count % 8) % 8) as u8
}

impl GamepadConfig {
    pub fn total_special_button_count(&self) -> u8 {
        self.special_buttons.as_array().iter().filter(|f| **f).count() as u8
    }

    pub fn desktop_special_button_count(&self) -> u8 {
        self.special_buttons.as_array()[..SpecialButton::DESKTOP_COUNT]
            .iter()
            .filter(|f| **f)
            .count() as u8
    }

    pub fn consumer_special_button_count(&self) -> u8 {
        self.special_buttons.as_array()[SpecialButton::DESKTOP_COUNT..]
            .iter()
            .filter(|f| **f)
            .count() as u8
    }

    pub fn axis_count(&self) -> u8 {
        Axis::ALL.iter().filter(|a| self.axes.is_enabled(**a)).count() as u8
    }

    pub fn simulation_count(&self) -> u8 {
        SimulationControl::ALL
            .iter()
            .filter(|c| self.simulation.is_enabled(**c))
            .count() as u8
    }

    pub fn button_padding_bits(&self) -> u8 {
        padding_bits(self.button_count as usize)
    }

    pub fn special_button_padding_bits(&self) -> u8 {
        padding_bits(self.total_special_button_count() as usize)
    }

    pub fn button_bytes(&self) -> usize {
        (self.button_count as usize).div_ceil(8)
    }

    pub fn special_button_bytes(&self) -> usize {
        (self.total_special_button_count() as usize).div_ceil(8)
    }

    /// Enabled axes in report order
    pub fn enabled_axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::REPORT_ORDER
            .into_iter()
            .filter(|a| self.axes.is_enabled(*a))
    }

    /// Enabled simulation controls in report order
    pub fn enabled_simulation(&self) -> impl Iterator<Item = SimulationControl> + '_ {
        SimulationControl::ALL
            .into_iter()
            .filter(|c| self.simulation.is_enabled(*c))
    }

    /// Enabled special buttons in logical order
    pub fn enabled_special_buttons(&self) -> impl Iterator<Item = SpecialButton> + '_ {
        SpecialButton::ALL
            .into_iter()
            .filter(|b| self.special_buttons.is_enabled(*b))
    }
}

/// Keyboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    pub report_id: u8,
    /// Simultaneous non-modifier keys (1..=6)
    pub key_count: u8,
    /// Pause after each press and release when typing text
    pub key_delay_ms: u64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            report_id: KEYBOARD_REPORT_ID,
            key_count: MAX_KEYBOARD_KEYS,
            key_delay_ms: 15,
        }
    }
}

impl KeyboardConfig {
    /// Set the key count, saturating into `1..=MAX_KEYBOARD_KEYS`
    pub fn set_key_count(&mut self, count: u8) {
        self.key_count = count.clamp(1, MAX_KEYBOARD_KEYS);
    }
}

/// Mouse configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    pub report_id: u8,
    /// Buttons in the bitmap (1..=8)
    pub button_count: u8,
    /// Declare a vertical wheel
    pub wheel: bool,
    /// Declare a horizontal pan field
    pub h_wheel: bool,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            report_id: MOUSE_REPORT_ID,
            button_count: 5,
            wheel: true,
            h_wheel: true,
        }
    }
}

impl MouseConfig {
    /// Set the button count, saturating into `1..=MAX_MOUSE_BUTTONS`
    pub fn set_button_count(&mut self, count: u8) {
        self.button_count = count.clamp(1, MAX_MOUSE_BUTTONS);
    }
}

impl ControllerConfig {
    /// Apply the saturating setters to values that bypassed them
    pub fn normalize(&mut self) {
        self.keyboard.set_key_count(self.keyboard.key_count);
        self.mouse.set_button_count(self.mouse.button_count);
    }

    /// Report id of an enabled profile
    pub fn report_id(&self, profile: Profile) -> u8 {
        match profile {
            Profile::Gamepad => self.gamepad.report_id,
            Profile::Keyboard => self.keyboard.report_id,
            Profile::Mouse => self.mouse.report_id,
        }
    }

    /// Reject combinations that can never compile into a usable descriptor
    pub fn validate(&self) -> Result<()> {
        if self.profiles.iter().next().is_none() {
            return Err(ControllerError::Config("no profile enabled".to_string()));
        }

        let mut seen: Vec<(u8, Profile)> = Vec::with_capacity(3);
        for profile in self.profiles.iter() {
            let id = self.report_id(profile);
            if id == 0 {
                return Err(ControllerError::Config(format!(
                    "{} report id must not be 0",
                    profile
                )));
            }
            if let Some((_, other)) = seen.iter().find(|(seen_id, _)| *seen_id == id) {
                return Err(ControllerError::Config(format!(
                    "{} and {} both use report id {}",
                    other, profile, id
                )));
            }
            seen.push((id, profile));
        }

        if self.profiles.gamepad {
            let gamepad = &self.gamepad;
            if gamepad.button_count > MAX_BUTTONS {
                return Err(ControllerError::Config(format!(
                    "button count {} exceeds {}",
                    gamepad.button_count, MAX_BUTTONS
                )));
            }
            if gamepad.hat_switch_count > MAX_HAT_SWITCHES {
                return Err(ControllerError::Config(format!(
                    "hat switch count {} exceeds {}",
                    gamepad.hat_switch_count, MAX_HAT_SWITCHES
                )));
            }
            if gamepad.output_report && gamepad.output_report_length == 0 {
                return Err(ControllerError::Config(
                    "output report length must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert!(config.auto_report);
        assert_eq!(config.gamepad.button_count, 16);
        assert_eq!(config.gamepad.axis_count(), 8);
        assert_eq!(config.gamepad.simulation_count(), 0);
        assert_eq!(config.gamepad.total_special_button_count(), 0);
        assert_eq!(config.keyboard.key_count, 6);
        assert_eq!(config.mouse.button_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_special_button_partitions() {
        let mut gamepad = GamepadConfig::default();
        gamepad.special_buttons.select = true;
        gamepad.special_buttons.home = true;
        gamepad.special_buttons.volume_mute = true;

        assert_eq!(gamepad.total_special_button_count(), 3);
        assert_eq!(gamepad.desktop_special_button_count(), 1);
        assert_eq!(gamepad.consumer_special_button_count(), 2);
        assert_eq!(gamepad.special_button_padding_bits(), 5);
        assert_eq!(gamepad.special_button_bytes(), 1);
    }

    #[test]
    fn test_button_padding() {
        let mut gamepad = GamepadConfig::default();
        for (count, padding, bytes) in [(0, 0, 0), (1, 7, 1), (8, 0, 1), (10, 6, 2), (128, 0, 16)] {
            gamepad.button_count = count;
            assert_eq!(gamepad.button_padding_bits(), padding, "count {}", count);
            assert_eq!(gamepad.button_bytes(), bytes, "count {}", count);
        }
    }

    #[test]
    fn test_saturating_setters() {
        let mut keyboard = KeyboardConfig::default();
        keyboard.set_key_count(0);
        assert_eq!(keyboard.key_count, 1);
        keyboard.set_key_count(20);
        assert_eq!(keyboard.key_count, MAX_KEYBOARD_KEYS);

        let mut mouse = MouseConfig::default();
        mouse.set_button_count(0);
        assert_eq!(mouse.button_count, 1);
        mouse.set_button_count(9);
        assert_eq!(mouse.button_count, MAX_MOUSE_BUTTONS);
    }

    #[test]
    fn test_enabled_axes_follow_report_order() {
        let mut gamepad = GamepadConfig::default();
        gamepad.axes = AxisFlags::all(false);
        gamepad.axes.rx = true;
        gamepad.axes.rz = true;
        gamepad.axes.x = true;

        let axes: Vec<Axis> = gamepad.enabled_axes().collect();
        assert_eq!(axes, vec![Axis::X, Axis::Rz, Axis::Rx]);
    }

    #[test]
    fn test_report_id_collision_rejected() {
        let mut config = ControllerConfig::default();
        config.gamepad.report_id = MOUSE_REPORT_ID;
        assert!(matches!(config.validate(), Err(ControllerError::Config(_))));

        config.profiles.mouse = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_counts_rejected() {
        let mut config = ControllerConfig::default();
        config.gamepad.button_count = 129;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.gamepad.hat_switch_count = 5;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.profiles = ProfileSet::only(Profile::Keyboard);
        config.profiles.keyboard = false;
        assert!(config.validate().is_err());
    }
}
