//! Identifiers for the controls a controller can expose

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::usage::{consumer, desktop, simulation};
use crate::error::{ControllerError, Result};

/// One of the independently-shaped reports sharing the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Gamepad,
    Keyboard,
    Mouse,
}

impl Profile {
    /// Descriptor order
    pub const ALL: [Profile; 3] = [Profile::Gamepad, Profile::Keyboard, Profile::Mouse];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gamepad => "gamepad",
            Self::Keyboard => "keyboard",
            Self::Mouse => "mouse",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generic Desktop usage of the gamepad application collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControllerType {
    Joystick,
    #[default]
    Gamepad,
    MultiAxis,
}

impl ControllerType {
    pub fn usage(&self) -> u8 {
        match self {
            Self::Joystick => 0x04,
            Self::Gamepad => 0x05,
            Self::MultiAxis => 0x08,
        }
    }
}

/// Non-positional gamepad buttons, in their fixed logical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SpecialButton {
    Start = 0,
    Select = 1,
    Menu = 2,
    Home = 3,
    Back = 4,
    VolumeInc = 5,
    VolumeDec = 6,
    VolumeMute = 7,
}

impl SpecialButton {
    pub const ALL: [SpecialButton; 8] = [
        SpecialButton::Start,
        SpecialButton::Select,
        SpecialButton::Menu,
        SpecialButton::Home,
        SpecialButton::Back,
        SpecialButton::VolumeInc,
        SpecialButton::VolumeDec,
        SpecialButton::VolumeMute,
    ];

    /// Logical indices below this live on the Generic Desktop page
    pub const DESKTOP_COUNT: usize = 3;

    /// Look up a button by its logical index
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(ControllerError::UnknownSpecialButton(index))
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Start, Select and Menu; the rest are consumer controls
    pub fn is_desktop(&self) -> bool {
        self.index() < Self::DESKTOP_COUNT
    }

    /// Usage code on the button's page
    pub fn usage(&self) -> u16 {
        match self {
            Self::Start => desktop::START as u16,
            Self::Select => desktop::SELECT as u16,
            Self::Menu => desktop::APP_MENU as u16,
            Self::Home => consumer::AC_HOME,
            Self::Back => consumer::AC_BACK,
            Self::VolumeInc => consumer::VOLUME_UP,
            Self::VolumeDec => consumer::VOLUME_DOWN,
            Self::VolumeMute => consumer::MUTE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Select => "select",
            Self::Menu => "menu",
            Self::Home => "home",
            Self::Back => "back",
            Self::VolumeInc => "volume_inc",
            Self::VolumeDec => "volume_dec",
            Self::VolumeMute => "volume_mute",
        }
    }
}

impl TryFrom<u8> for SpecialButton {
    type Error = ControllerError;

    fn try_from(index: u8) -> Result<Self> {
        Self::from_index(index)
    }
}

/// Gamepad axes, in configuration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    Slider1,
    Slider2,
}

impl Axis {
    pub const ALL: [Axis; 8] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Rx,
        Axis::Ry,
        Axis::Rz,
        Axis::Slider1,
        Axis::Slider2,
    ];

    /// Order in which enabled axes appear in the descriptor and the report
    pub const REPORT_ORDER: [Axis; 8] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Rz,
        Axis::Rx,
        Axis::Ry,
        Axis::Slider1,
        Axis::Slider2,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn usage(&self) -> u8 {
        match self {
            Self::X => desktop::X,
            Self::Y => desktop::Y,
            Self::Z => desktop::Z,
            Self::Rx => desktop::RX,
            Self::Ry => desktop::RY,
            Self::Rz => desktop::RZ,
            Self::Slider1 | Self::Slider2 => desktop::SLIDER,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Rx => "rx",
            Self::Ry => "ry",
            Self::Rz => "rz",
            Self::Slider1 => "slider1",
            Self::Slider2 => "slider2",
        }
    }
}

impl FromStr for Axis {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|axis| axis.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ControllerError::UnknownAxis(s.to_string()))
    }
}

/// Simulation Controls page inputs, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationControl {
    Rudder,
    Throttle,
    Accelerator,
    Brake,
    Steering,
}

impl SimulationControl {
    pub const ALL: [SimulationControl; 5] = [
        SimulationControl::Rudder,
        SimulationControl::Throttle,
        SimulationControl::Accelerator,
        SimulationControl::Brake,
        SimulationControl::Steering,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn usage(&self) -> u8 {
        match self {
            Self::Rudder => simulation::RUDDER,
            Self::Throttle => simulation::THROTTLE,
            Self::Accelerator => simulation::ACCELERATOR,
            Self::Brake => simulation::BRAKE,
            Self::Steering => simulation::STEERING,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rudder => "rudder",
            Self::Throttle => "throttle",
            Self::Accelerator => "accelerator",
            Self::Brake => "brake",
            Self::Steering => "steering",
        }
    }
}

impl FromStr for SimulationControl {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|control| control.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ControllerError::UnknownAxis(s.to_string()))
    }
}

/// Mouse button bits
pub mod mouse_button {
    pub const LEFT: u8 = 0x01;
    pub const RIGHT: u8 = 0x02;
    pub const MIDDLE: u8 = 0x04;
    pub const BACK: u8 = 0x08;
    pub const FORWARD: u8 = 0x10;
}

/// Hat switch directions; 0 is the null state
pub mod hat {
    pub const CENTERED: i8 = 0;
    pub const UP: i8 = 1;
    pub const UP_RIGHT: i8 = 2;
    pub const RIGHT: i8 = 3;
    pub const DOWN_RIGHT: i8 = 4;
    pub const DOWN: i8 = 5;
    pub const DOWN_LEFT: i8 = 6;
    pub const LEFT: i8 = 7;
    pub const UP_LEFT: i8 = 8;
}

/// Keyboard modifier flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardModifiers {
    #[serde(default)]
    pub left_ctrl: bool,
    #[serde(default)]
    pub left_shift: bool,
    #[serde(default)]
    pub left_alt: bool,
    /// Left Meta (Windows/Super key)
    #[serde(default)]
    pub left_meta: bool,
    #[serde(default)]
    pub right_ctrl: bool,
    #[serde(default)]
    pub right_shift: bool,
    /// Right Alt (AltGr)
    #[serde(default)]
    pub right_alt: bool,
    #[serde(default)]
    pub right_meta: bool,
}

impl KeyboardModifiers {
    const BITS: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];

    fn flags(&self) -> [bool; 8] {
        [
            self.left_ctrl,
            self.left_shift,
            self.left_alt,
            self.left_meta,
            self.right_ctrl,
            self.right_shift,
            self.right_alt,
            self.right_meta,
        ]
    }

    /// Convert to the report's modifier byte
    pub fn to_hid_byte(&self) -> u8 {
        self.flags()
            .iter()
            .zip(Self::BITS)
            .filter(|(set, _)| **set)
            .fold(0, |byte, (_, bit)| byte | bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_conversion() {
        let mods = KeyboardModifiers {
            left_ctrl: true,
            left_shift: true,
            ..Default::default()
        };
        assert_eq!(mods.to_hid_byte(), 0x03);

        let right = KeyboardModifiers {
            right_alt: true,
            right_meta: true,
            ..Default::default()
        };
        assert_eq!(right.to_hid_byte(), 0xC0);
        assert_eq!(KeyboardModifiers::default().to_hid_byte(), 0);
    }

    #[test]
    fn test_special_button_lookup() {
        assert_eq!(SpecialButton::from_index(1).unwrap(), SpecialButton::Select);
        assert!(SpecialButton::Menu.is_desktop());
        assert!(!SpecialButton::Home.is_desktop());
        assert!(matches!(
            SpecialButton::from_index(8),
            Err(ControllerError::UnknownSpecialButton(8))
        ));
    }

    #[test]
    fn test_axis_parsing() {
        assert_eq!("RZ".parse::<Axis>().unwrap(), Axis::Rz);
        assert_eq!("slider2".parse::<Axis>().unwrap(), Axis::Slider2);
        assert!(matches!(
            "w".parse::<Axis>(),
            Err(ControllerError::UnknownAxis(_))
        ));
        assert_eq!(
            "brake".parse::<SimulationControl>().unwrap(),
            SimulationControl::Brake
        );
    }

    #[test]
    fn test_report_order_covers_every_axis() {
        for axis in Axis::ALL {
            assert_eq!(Axis::REPORT_ORDER.iter().filter(|a| **a == axis).count(), 1);
        }
    }
}
