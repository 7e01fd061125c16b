//! HID report descriptor compiler
//!
//! Turns a [`ControllerConfig`] into the single descriptor published to the
//! host. One application collection per enabled profile, always in the order
//! gamepad, keyboard, mouse. Fields a configuration leaves out take no space.

mod builder;
mod gamepad;
pub mod items;
mod keyboard;
mod mouse;

pub use builder::DescriptorBuilder;

use std::fmt;

use tracing::debug;

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::hid::Profile;

/// Size of the descriptor buffer the transport accepts
pub const DESCRIPTOR_CAPACITY: usize = 300;

/// A compiled report descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDescriptor {
    bytes: Vec<u8>,
}

impl ReportDescriptor {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Iterate the descriptor's short items
    pub fn items(&self) -> items::ItemReader<'_> {
        items::ItemReader::new(&self.bytes)
    }

    /// Space-separated uppercase hex
    pub fn to_hex(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl AsRef<[u8]> for ReportDescriptor {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for ReportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compile a configuration into a descriptor that fits [`DESCRIPTOR_CAPACITY`]
pub fn compile(config: &ControllerConfig) -> Result<ReportDescriptor> {
    compile_with_capacity(config, DESCRIPTOR_CAPACITY)
}

/// Compile against an explicit buffer capacity
pub fn compile_with_capacity(config: &ControllerConfig, capacity: usize) -> Result<ReportDescriptor> {
    let mut config = config.clone();
    config.normalize();
    config.validate()?;

    let mut builder = DescriptorBuilder::new(capacity);
    for profile in config.profiles.iter() {
        let start = builder.len();
        match profile {
            Profile::Gamepad => gamepad::write(&mut builder, &config.gamepad)?,
            Profile::Keyboard => keyboard::write(&mut builder, &config.keyboard)?,
            Profile::Mouse => mouse::write(&mut builder, &config.mouse)?,
        }
        debug!(
            profile = %profile,
            bytes = builder.len() - start,
            "Compiled descriptor collection"
        );
    }

    let descriptor = builder.finish();
    debug!(len = descriptor.len(), "Report descriptor compiled");
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisFlags, ProfileSet};
    use crate::error::ControllerError;
    use crate::report;

    fn gamepad_only() -> ControllerConfig {
        ControllerConfig {
            profiles: ProfileSet::only(Profile::Gamepad),
            ..Default::default()
        }
    }

    fn everything_enabled() -> ControllerConfig {
        let mut config = ControllerConfig::default();
        let gamepad = &mut config.gamepad;
        gamepad.button_count = 128;
        gamepad.hat_switch_count = 4;
        for button in crate::hid::SpecialButton::ALL {
            gamepad.special_buttons.set(button, true);
        }
        for control in crate::hid::SimulationControl::ALL {
            gamepad.simulation.set(control, true);
        }
        gamepad.include_gyroscope = true;
        gamepad.include_accelerometer = true;
        gamepad.output_report = true;
        gamepad.output_report_length = 300;
        config
    }

    #[test]
    fn test_minimal_gamepad_bytes() {
        let mut config = gamepad_only();
        config.gamepad.button_count = 10;
        config.gamepad.axes = AxisFlags::all(false);
        config.gamepad.axes.x = true;
        config.gamepad.axes.y = true;

        let descriptor = compile(&config).unwrap();
        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, 0x85, 0x01,
            // Buttons 1..10 plus 6 bits padding
            0x05, 0x09, 0x15, 0x00, 0x25, 0x01, 0x75, 0x01,
            0x19, 0x01, 0x29, 0x0A, 0x95, 0x0A, 0x81, 0x02,
            0x75, 0x01, 0x95, 0x06, 0x81, 0x03,
            // X, Y
            0x05, 0x01, 0x16, 0x00, 0x00, 0x26, 0xFF, 0x7F,
            0x75, 0x10, 0x95, 0x02, 0xA1, 0x00, 0x09, 0x30,
            0x09, 0x31, 0x81, 0x02, 0xC0,
            // One hat
            0xA1, 0x00, 0x05, 0x01, 0x09, 0x39, 0x15, 0x01,
            0x25, 0x08, 0x35, 0x00, 0x46, 0x3B, 0x01, 0x65,
            0x12, 0x75, 0x08, 0x95, 0x01, 0x81, 0x42, 0xC0,
            0xC0,
        ];
        assert_eq!(descriptor.as_bytes(), expected);
    }

    #[test]
    fn test_special_buttons_split_by_page() {
        let mut config = gamepad_only();
        config.gamepad.button_count = 0;
        config.gamepad.hat_switch_count = 0;
        config.gamepad.axes = AxisFlags::all(false);
        config.gamepad.special_buttons.select = true;
        config.gamepad.special_buttons.home = true;

        let descriptor = compile(&config).unwrap();
        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, 0x85, 0x01,
            0x15, 0x00, 0x25, 0x01, 0x75, 0x01,
            0x05, 0x01, 0x95, 0x01, 0x09, 0x3E, 0x81, 0x02,
            0x05, 0x0C, 0x95, 0x01, 0x0A, 0x23, 0x02, 0x81, 0x02,
            0x75, 0x01, 0x95, 0x06, 0x81, 0x03,
            0xC0,
        ];
        assert_eq!(descriptor.as_bytes(), expected);
    }

    #[test]
    fn test_keyboard_collection() {
        let config = ControllerConfig {
            profiles: ProfileSet::only(Profile::Keyboard),
            ..Default::default()
        };
        let descriptor = compile(&config).unwrap();
        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, 0x85, 0x02,
            0x05, 0x07, 0x19, 0xE0, 0x29, 0xE7, 0x15, 0x00,
            0x25, 0x01, 0x75, 0x01, 0x95, 0x08, 0x81, 0x02,
            0x95, 0x01, 0x75, 0x08, 0x81, 0x03,
            0x95, 0x06, 0x75, 0x08, 0x15, 0x00, 0x25, 0x65,
            0x05, 0x07, 0x19, 0x00, 0x29, 0x65, 0x81, 0x00,
            0xC0,
        ];
        assert_eq!(descriptor.as_bytes(), expected);
    }

    #[test]
    fn test_mouse_collection_optional_wheels() {
        let mut config = ControllerConfig {
            profiles: ProfileSet::only(Profile::Mouse),
            ..Default::default()
        };
        config.mouse.button_count = 8;
        config.mouse.wheel = false;
        config.mouse.h_wheel = false;

        let descriptor = compile(&config).unwrap();
        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x09, 0x01,
            0xA1, 0x00, 0x85, 0x03,
            0x05, 0x09, 0x19, 0x01, 0x29, 0x08, 0x15, 0x00,
            0x25, 0x01, 0x75, 0x01, 0x95, 0x08, 0x81, 0x02,
            0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x15, 0x81,
            0x25, 0x7F, 0x75, 0x08, 0x95, 0x02, 0x81, 0x06,
            0xC0, 0xC0,
        ];
        assert_eq!(descriptor.as_bytes(), expected);

        config.mouse.h_wheel = true;
        let with_pan = compile(&config).unwrap();
        let bytes = with_pan.as_bytes();
        #[rustfmt::skip]
        let pan: &[u8] = &[
            0x05, 0x0C, 0x0A, 0x38, 0x02, 0x15, 0x81, 0x25,
            0x7F, 0x75, 0x08, 0x95, 0x01, 0x81, 0x06,
            0xC0, 0xC0,
        ];
        assert_eq!(&bytes[bytes.len() - pan.len()..], pan);
    }

    #[test]
    fn test_profiles_concatenate_in_fixed_order() {
        let config = ControllerConfig::default();
        let all = compile(&config).unwrap();

        let mut parts = Vec::new();
        for profile in Profile::ALL {
            let single = ControllerConfig {
                profiles: ProfileSet::only(profile),
                ..Default::default()
            };
            parts.extend_from_slice(compile(&single).unwrap().as_bytes());
        }
        assert_eq!(all.as_bytes(), parts.as_slice());
    }

    #[test]
    fn test_default_config_fits() {
        let descriptor = compile(&ControllerConfig::default()).unwrap();
        assert_eq!(descriptor.len(), 82 + 47 + 79);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let config = everything_enabled();
        let first = compile_with_capacity(&config, 1024).unwrap();
        let second = compile_with_capacity(&config, 1024).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let err = compile(&everything_enabled()).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::DescriptorOverflow {
                capacity: DESCRIPTOR_CAPACITY,
                ..
            }
        ));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_wide_output_report_count() {
        let mut config = gamepad_only();
        config.gamepad.output_report = true;
        config.gamepad.output_report_length = 300;
        let descriptor = compile(&config).unwrap();
        let bytes = descriptor.as_bytes();
        assert_eq!(&bytes[bytes.len() - 6..], &[0x96, 0x2C, 0x01, 0x91, 0x02, 0xC0]);

        config.gamepad.output_report_length = 64;
        let descriptor = compile(&config).unwrap();
        let bytes = descriptor.as_bytes();
        assert_eq!(&bytes[bytes.len() - 5..], &[0x95, 0x40, 0x91, 0x02, 0xC0]);
    }

    #[test]
    fn test_out_of_range_counts_clamped_before_compiling() {
        let mut config = ControllerConfig::default();
        config.keyboard.key_count = 0;
        config.mouse.button_count = 12;

        let descriptor = compile(&config).unwrap();
        let bits = items::input_bits_by_report(descriptor.as_bytes());
        // One key slot, never zero
        assert_eq!(bits[&config.keyboard.report_id], 8 + 8 + 8);
        assert_eq!(
            bits[&config.mouse.report_id] as usize,
            report::MOUSE_REPORT_LEN * 8
        );

        config.normalize();
        assert_eq!(compile(&config).unwrap(), descriptor);
    }

    #[test]
    fn test_declared_input_matches_report_sizes() {
        let mut configs = vec![ControllerConfig::default(), everything_enabled()];
        for buttons in [0u8, 1, 7, 8, 9, 31, 64] {
            for specials in [0u8, 0b0000_0010, 0b0000_1010, 0b1111_1111, 0b1110_0000] {
                let mut config = ControllerConfig::default();
                config.gamepad.button_count = buttons;
                config.gamepad.hat_switch_count = buttons % 5;
                config.gamepad.include_gyroscope = buttons % 2 == 1;
                config.gamepad.axes.z = specials & 1 == 0;
                config.gamepad.simulation.brake = buttons > 8;
                for button in crate::hid::SpecialButton::ALL {
                    let enabled = specials & (1 << button.index()) != 0;
                    config.gamepad.special_buttons.set(button, enabled);
                }
                configs.push(config);
            }
        }

        for config in configs {
            let descriptor = compile_with_capacity(&config, 1024).unwrap();
            let bits = items::input_bits_by_report(descriptor.as_bytes());
            assert_eq!(
                bits[&config.gamepad.report_id] as usize,
                report::gamepad_report_size(&config.gamepad) * 8,
                "{:?}",
                config.gamepad
            );
            assert_eq!(
                bits[&config.keyboard.report_id] as usize,
                report::KEYBOARD_REPORT_LEN * 8
            );
        }
    }
}
