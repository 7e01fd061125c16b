//! Gamepad application collection
//!
//! Field order here is the packing order of the gamepad report; the encoder
//! in `report::gamepad` walks the same sequence.

use super::builder::DescriptorBuilder;
use super::items::{flags, UNIT_DEGREES};
use crate::config::GamepadConfig;
use crate::error::Result;
use crate::hid::usage::{desktop, page};

pub(super) fn write(b: &mut DescriptorBuilder, config: &GamepadConfig) -> Result<()> {
    b.usage_page(page::GENERIC_DESKTOP)?;
    b.usage(config.controller_type.usage())?;
    b.application_collection()?;
    b.report_id(config.report_id)?;

    write_buttons(b, config)?;
    write_special_buttons(b, config)?;
    write_axes(b, config)?;
    write_simulation(b, config)?;
    if config.include_gyroscope {
        write_motion(b, config, [desktop::RX, desktop::RY, desktop::RZ])?;
    }
    if config.include_accelerometer {
        write_motion(b, config, [desktop::VX, desktop::VY, desktop::VZ])?;
    }
    write_hats(b, config)?;
    write_output(b, config)?;

    b.end_collection()?;
    Ok(())
}

fn write_buttons(b: &mut DescriptorBuilder, config: &GamepadConfig) -> Result<()> {
    if config.button_count == 0 {
        return Ok(());
    }

    b.usage_page(page::BUTTON)?;
    b.logical_minimum(0)?;
    b.logical_maximum(1)?;
    b.report_size(1)?;
    b.usage_minimum(1)?;
    b.usage_maximum(config.button_count)?;
    b.report_count(config.button_count as u16)?;
    b.input(flags::DATA_VAR_ABS)?;

    write_padding(b, config.button_padding_bits())
}

fn write_special_buttons(b: &mut DescriptorBuilder, config: &GamepadConfig) -> Result<()> {
    if config.total_special_button_count() == 0 {
        return Ok(());
    }

    b.logical_minimum(0)?;
    b.logical_maximum(1)?;
    b.report_size(1)?;

    let desktop_count = config.desktop_special_button_count();
    if desktop_count > 0 {
        b.usage_page(page::GENERIC_DESKTOP)?;
        b.report_count(desktop_count as u16)?;
        for button in config.enabled_special_buttons().filter(|button| button.is_desktop()) {
            b.usage_u16(button.usage())?;
        }
        b.input(flags::DATA_VAR_ABS)?;
    }

    let consumer_count = config.consumer_special_button_count();
    if consumer_count > 0 {
        b.usage_page(page::CONSUMER)?;
        b.report_count(consumer_count as u16)?;
        for button in config.enabled_special_buttons().filter(|button| !button.is_desktop()) {
            b.usage_u16(button.usage())?;
        }
        b.input(flags::DATA_VAR_ABS)?;
    }

    write_padding(b, config.special_button_padding_bits())
}

/// Constant bits that round a bitmap up to a whole byte
fn write_padding(b: &mut DescriptorBuilder, bits: u8) -> Result<()> {
    if bits == 0 {
        return Ok(());
    }
    b.report_size(1)?;
    b.report_count(bits as u16)?;
    b.input(flags::CONST_VAR_ABS)?;
    Ok(())
}

fn write_axes(b: &mut DescriptorBuilder, config: &GamepadConfig) -> Result<()> {
    let count = config.axis_count();
    if count == 0 {
        return Ok(());
    }

    b.usage_page(page::GENERIC_DESKTOP)?;
    b.logical_minimum_i16(config.axes_range.min)?;
    b.logical_maximum_i16(config.axes_range.max)?;
    b.report_size(16)?;
    b.report_count(count as u16)?;
    b.physical_collection()?;
    for axis in config.enabled_axes() {
        b.usage(axis.usage())?;
    }
    b.input(flags::DATA_VAR_ABS)?;
    b.end_collection()?;
    Ok(())
}

fn write_simulation(b: &mut DescriptorBuilder, config: &GamepadConfig) -> Result<()> {
    let count = config.simulation_count();
    if count == 0 {
        return Ok(());
    }

    b.usage_page(page::SIMULATION)?;
    b.logical_minimum_i16(config.simulation_range.min)?;
    b.logical_maximum_i16(config.simulation_range.max)?;
    b.report_size(16)?;
    b.report_count(count as u16)?;
    b.physical_collection()?;
    for control in config.enabled_simulation() {
        b.usage(control.usage())?;
    }
    b.input(flags::DATA_VAR_ABS)?;
    b.end_collection()?;
    Ok(())
}

/// Three 16-bit motion fields (gyroscope or accelerometer)
fn write_motion(b: &mut DescriptorBuilder, config: &GamepadConfig, usages: [u8; 3]) -> Result<()> {
    b.physical_collection()?;
    b.usage_page(page::GENERIC_DESKTOP)?;
    for usage in usages {
        b.usage(usage)?;
    }
    b.logical_minimum_i16(config.motion_range.min)?;
    b.logical_maximum_i16(config.motion_range.max)?;
    b.report_size(16)?;
    b.report_count(3)?;
    b.input(flags::DATA_VAR_ABS)?;
    b.end_collection()?;
    Ok(())
}

fn write_hats(b: &mut DescriptorBuilder, config: &GamepadConfig) -> Result<()> {
    let count = config.hat_switch_count;
    if count == 0 {
        return Ok(());
    }

    b.physical_collection()?;
    b.usage_page(page::GENERIC_DESKTOP)?;
    for _ in 0..count {
        b.usage(desktop::HAT_SWITCH)?;
    }
    // Eight directions, 0 is the null (centered) state
    b.logical_minimum(1)?;
    b.logical_maximum(8)?;
    b.physical_minimum(0)?;
    b.physical_maximum_i16(315)?;
    b.unit(UNIT_DEGREES)?;
    b.report_size(8)?;
    b.report_count(count as u16)?;
    b.input(flags::DATA_VAR_ABS_NULL)?;
    b.end_collection()?;
    Ok(())
}

fn write_output(b: &mut DescriptorBuilder, config: &GamepadConfig) -> Result<()> {
    if !config.output_report {
        return Ok(());
    }

    b.usage_page_u16(page::VENDOR)?;
    b.usage(0x01)?;
    b.usage(0x01)?;
    b.logical_minimum(0)?;
    b.logical_maximum_i16(0x00FF)?;
    b.report_size(8)?;
    b.report_count(config.output_report_length)?;
    b.output(flags::DATA_VAR_ABS)?;
    Ok(())
}
