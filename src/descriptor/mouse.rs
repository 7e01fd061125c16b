//! Mouse application collection
//!
//! Report layout:
//!   [0] Buttons (`button_count` bits) + padding
//!   [1] X movement (signed 8-bit)
//!   [2] Y movement (signed 8-bit)
//!   [3] Wheel (signed 8-bit, if enabled)
//!   [4] Horizontal pan (signed 8-bit, if enabled)

use super::builder::DescriptorBuilder;
use super::items::flags;
use crate::config::{padding_bits, MouseConfig};
use crate::error::Result;
use crate::hid::usage::{consumer, desktop, page};

pub(super) fn write(b: &mut DescriptorBuilder, config: &MouseConfig) -> Result<()> {
    b.usage_page(page::GENERIC_DESKTOP)?;
    b.usage(desktop::MOUSE)?;
    b.application_collection()?;
    b.usage(desktop::POINTER)?;
    b.physical_collection()?;
    b.report_id(config.report_id)?;

    b.usage_page(page::BUTTON)?;
    b.usage_minimum(1)?;
    b.usage_maximum(config.button_count)?;
    b.logical_minimum(0)?;
    b.logical_maximum(1)?;
    b.report_size(1)?;
    b.report_count(config.button_count as u16)?;
    b.input(flags::DATA_VAR_ABS)?;

    let padding = padding_bits(config.button_count as usize);
    if padding > 0 {
        b.report_size(padding)?;
        b.report_count(1)?;
        b.input(flags::CONST_VAR_ABS)?;
    }

    b.usage_page(page::GENERIC_DESKTOP)?;
    b.usage(desktop::X)?;
    b.usage(desktop::Y)?;
    write_relative_byte_fields(b, 2)?;

    if config.wheel {
        b.usage(desktop::WHEEL)?;
        write_relative_byte_fields(b, 1)?;
    }

    if config.h_wheel {
        b.usage_page(page::CONSUMER)?;
        b.usage_u16(consumer::AC_PAN)?;
        write_relative_byte_fields(b, 1)?;
    }

    b.end_collection()?;
    b.end_collection()?;
    Ok(())
}

/// Signed 8-bit relative fields for the usages just declared
fn write_relative_byte_fields(b: &mut DescriptorBuilder, count: u16) -> Result<()> {
    b.logical_minimum(-127)?;
    b.logical_maximum(127)?;
    b.report_size(8)?;
    b.report_count(count)?;
    b.input(flags::DATA_VAR_REL)?;
    Ok(())
}
