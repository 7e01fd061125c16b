//! Append-only descriptor buffer with a capacity check on every item

use super::items::{collection, prefix, size_code};
use super::ReportDescriptor;
use crate::error::{ControllerError, Result};
use crate::hid::usage::is_extended_usage;

/// Builds a report descriptor one short item at a time
///
/// Every append checks the capacity first, so an oversized configuration
/// fails instead of producing a truncated descriptor.
#[derive(Debug)]
pub struct DescriptorBuilder {
    bytes: Vec<u8>,
    capacity: usize,
}

impl DescriptorBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Append one short item
    pub fn item(&mut self, item_prefix: u8, data: &[u8]) -> Result<&mut Self> {
        let size = size_code(data.len()).ok_or_else(|| {
            ControllerError::Config(format!("invalid short item length {}", data.len()))
        })?;
        let needed = self.bytes.len() + 1 + data.len();
        if needed > self.capacity {
            return Err(ControllerError::DescriptorOverflow {
                needed,
                capacity: self.capacity,
            });
        }
        self.bytes.push(item_prefix | size);
        self.bytes.extend_from_slice(data);
        Ok(self)
    }

    pub fn usage_page(&mut self, page: u8) -> Result<&mut Self> {
        self.item(prefix::USAGE_PAGE, &[page])
    }

    /// Two-byte usage page (vendor-defined pages)
    pub fn usage_page_u16(&mut self, page: u16) -> Result<&mut Self> {
        self.item(prefix::USAGE_PAGE, &page.to_le_bytes())
    }

    pub fn usage(&mut self, usage: u8) -> Result<&mut Self> {
        self.item(prefix::USAGE, &[usage])
    }

    /// Usage with the shortest data length that fits
    pub fn usage_u16(&mut self, usage: u16) -> Result<&mut Self> {
        if is_extended_usage(usage) {
            self.item(prefix::USAGE, &usage.to_le_bytes())
        } else {
            self.usage(usage as u8)
        }
    }

    pub fn usage_minimum(&mut self, usage: u8) -> Result<&mut Self> {
        self.item(prefix::USAGE_MINIMUM, &[usage])
    }

    pub fn usage_maximum(&mut self, usage: u8) -> Result<&mut Self> {
        self.item(prefix::USAGE_MAXIMUM, &[usage])
    }

    pub fn application_collection(&mut self) -> Result<&mut Self> {
        self.item(prefix::COLLECTION, &[collection::APPLICATION])
    }

    pub fn physical_collection(&mut self) -> Result<&mut Self> {
        self.item(prefix::COLLECTION, &[collection::PHYSICAL])
    }

    pub fn end_collection(&mut self) -> Result<&mut Self> {
        self.item(prefix::END_COLLECTION, &[])
    }

    pub fn report_id(&mut self, id: u8) -> Result<&mut Self> {
        self.item(prefix::REPORT_ID, &[id])
    }

    pub fn logical_minimum(&mut self, value: i8) -> Result<&mut Self> {
        self.item(prefix::LOGICAL_MINIMUM, &value.to_le_bytes())
    }

    pub fn logical_maximum(&mut self, value: i8) -> Result<&mut Self> {
        self.item(prefix::LOGICAL_MAXIMUM, &value.to_le_bytes())
    }

    /// Logical minimum, always two data bytes
    pub fn logical_minimum_i16(&mut self, value: i16) -> Result<&mut Self> {
        self.item(prefix::LOGICAL_MINIMUM, &value.to_le_bytes())
    }

    /// Logical maximum, always two data bytes
    pub fn logical_maximum_i16(&mut self, value: i16) -> Result<&mut Self> {
        self.item(prefix::LOGICAL_MAXIMUM, &value.to_le_bytes())
    }

    pub fn physical_minimum(&mut self, value: i8) -> Result<&mut Self> {
        self.item(prefix::PHYSICAL_MINIMUM, &value.to_le_bytes())
    }

    pub fn physical_maximum_i16(&mut self, value: i16) -> Result<&mut Self> {
        self.item(prefix::PHYSICAL_MAXIMUM, &value.to_le_bytes())
    }

    pub fn unit(&mut self, unit: u8) -> Result<&mut Self> {
        self.item(prefix::UNIT, &[unit])
    }

    pub fn report_size(&mut self, bits: u8) -> Result<&mut Self> {
        self.item(prefix::REPORT_SIZE, &[bits])
    }

    /// Report count, widened to two data bytes above 255
    pub fn report_count(&mut self, count: u16) -> Result<&mut Self> {
        match u8::try_from(count) {
            Ok(short) => self.item(prefix::REPORT_COUNT, &[short]),
            Err(_) => self.item(prefix::REPORT_COUNT, &count.to_le_bytes()),
        }
    }

    pub fn input(&mut self, flags: u8) -> Result<&mut Self> {
        self.item(prefix::INPUT, &[flags])
    }

    pub fn output(&mut self, flags: u8) -> Result<&mut Self> {
        self.item(prefix::OUTPUT, &[flags])
    }

    pub fn finish(self) -> ReportDescriptor {
        ReportDescriptor { bytes: self.bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_encode_prefix_and_size() {
        let mut builder = DescriptorBuilder::new(64);
        builder
            .usage_page(0x01)
            .unwrap()
            .usage_u16(0x0223)
            .unwrap()
            .logical_maximum_i16(0x7FFF)
            .unwrap()
            .end_collection()
            .unwrap();
        assert_eq!(
            builder.finish().as_bytes(),
            &[0x05, 0x01, 0x0A, 0x23, 0x02, 0x26, 0xFF, 0x7F, 0xC0]
        );
    }

    #[test]
    fn test_report_count_widens() {
        let mut builder = DescriptorBuilder::new(16);
        builder.report_count(255).unwrap();
        builder.report_count(256).unwrap();
        assert_eq!(builder.finish().as_bytes(), &[0x95, 0xFF, 0x96, 0x00, 0x01]);
    }

    #[test]
    fn test_negative_logical_minimum() {
        let mut builder = DescriptorBuilder::new(8);
        builder.logical_minimum(-127).unwrap();
        builder.logical_minimum_i16(-32767).unwrap();
        assert_eq!(builder.finish().as_bytes(), &[0x15, 0x81, 0x16, 0x01, 0x80]);
    }

    #[test]
    fn test_capacity_checked_per_item() {
        let mut builder = DescriptorBuilder::new(3);
        builder.usage_page(0x01).unwrap();
        let err = builder.usage(0x05).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::DescriptorOverflow {
                needed: 4,
                capacity: 3
            }
        ));
        // Nothing partial is written
        assert_eq!(builder.len(), 2);
    }
}
