//! Keyboard application collection
//!
//! Report layout:
//!   [0] Modifier keys (8 bits)
//!   [1] Reserved
//!   [2..] Key code array (`key_count` slots)

use super::builder::DescriptorBuilder;
use super::items::flags;
use crate::config::KeyboardConfig;
use crate::error::Result;
use crate::hid::keymap::usb;
use crate::hid::usage::{desktop, page};

pub(super) fn write(b: &mut DescriptorBuilder, config: &KeyboardConfig) -> Result<()> {
    b.usage_page(page::GENERIC_DESKTOP)?;
    b.usage(desktop::KEYBOARD)?;
    b.application_collection()?;
    b.report_id(config.report_id)?;

    // Modifier byte, one bit per modifier key
    b.usage_page(page::KEYBOARD)?;
    b.usage_minimum(usb::KEY_LEFT_CTRL)?;
    b.usage_maximum(usb::KEY_RIGHT_META)?;
    b.logical_minimum(0)?;
    b.logical_maximum(1)?;
    b.report_size(1)?;
    b.report_count(8)?;
    b.input(flags::DATA_VAR_ABS)?;

    // Reserved byte
    b.report_count(1)?;
    b.report_size(8)?;
    b.input(flags::CONST_VAR_ABS)?;

    // Key array
    b.report_count(config.key_count as u16)?;
    b.report_size(8)?;
    b.logical_minimum(0)?;
    b.logical_maximum(usb::KEY_APPLICATION as i8)?;
    b.usage_page(page::KEYBOARD)?;
    b.usage_minimum(0)?;
    b.usage_maximum(usb::KEY_APPLICATION)?;
    b.input(flags::DATA_ARRAY)?;

    b.end_collection()?;
    Ok(())
}
