//! Short-item encoding and a reader for compiled descriptors
//!
//! Each short item is a prefix byte `tag << 4 | type << 2 | size` followed by
//! 0, 1, 2 or 4 data bytes (little-endian).

use std::collections::BTreeMap;

/// Item prefixes with the size bits cleared
pub mod prefix {
    // Main items
    pub const INPUT: u8 = 0x80;
    pub const OUTPUT: u8 = 0x90;
    pub const COLLECTION: u8 = 0xA0;
    pub const END_COLLECTION: u8 = 0xC0;

    // Global items
    pub const USAGE_PAGE: u8 = 0x04;
    pub const LOGICAL_MINIMUM: u8 = 0x14;
    pub const LOGICAL_MAXIMUM: u8 = 0x24;
    pub const PHYSICAL_MINIMUM: u8 = 0x34;
    pub const PHYSICAL_MAXIMUM: u8 = 0x44;
    pub const UNIT: u8 = 0x64;
    pub const REPORT_SIZE: u8 = 0x74;
    pub const REPORT_ID: u8 = 0x84;
    pub const REPORT_COUNT: u8 = 0x94;

    // Local items
    pub const USAGE: u8 = 0x08;
    pub const USAGE_MINIMUM: u8 = 0x18;
    pub const USAGE_MAXIMUM: u8 = 0x28;
}

/// Collection kinds
pub mod collection {
    pub const PHYSICAL: u8 = 0x00;
    pub const APPLICATION: u8 = 0x01;
}

/// Main item data flags
pub mod flags {
    /// Data, Array, Absolute
    pub const DATA_ARRAY: u8 = 0x00;
    /// Data, Variable, Absolute
    pub const DATA_VAR_ABS: u8 = 0x02;
    /// Constant, Variable, Absolute
    pub const CONST_VAR_ABS: u8 = 0x03;
    /// Data, Variable, Relative
    pub const DATA_VAR_REL: u8 = 0x06;
    /// Data, Variable, Absolute, Null State
    pub const DATA_VAR_ABS_NULL: u8 = 0x42;
}

/// Hat switch physical unit: English rotation, degrees
pub const UNIT_DEGREES: u8 = 0x12;

/// Size code for a data length
pub(crate) fn size_code(len: usize) -> Option<u8> {
    match len {
        0 => Some(0),
        1 => Some(1),
        2 => Some(2),
        4 => Some(3),
        _ => None,
    }
}

/// One short item of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item<'a> {
    /// Prefix with the size bits cleared
    pub prefix: u8,
    pub data: &'a [u8],
}

impl<'a> Item<'a> {
    /// Unsigned data value
    pub fn value(&self) -> u32 {
        self.data
            .iter()
            .rev()
            .fold(0u32, |acc, byte| (acc << 8) | *byte as u32)
    }

    /// Sign-extended data value
    pub fn signed_value(&self) -> i32 {
        match self.data.len() {
            1 => self.data[0] as i8 as i32,
            2 => i16::from_le_bytes([self.data[0], self.data[1]]) as i32,
            _ => self.value() as i32,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.prefix {
            prefix::INPUT => "Input",
            prefix::OUTPUT => "Output",
            prefix::COLLECTION => "Collection",
            prefix::END_COLLECTION => "End Collection",
            prefix::USAGE_PAGE => "Usage Page",
            prefix::LOGICAL_MINIMUM => "Logical Minimum",
            prefix::LOGICAL_MAXIMUM => "Logical Maximum",
            prefix::PHYSICAL_MINIMUM => "Physical Minimum",
            prefix::PHYSICAL_MAXIMUM => "Physical Maximum",
            prefix::UNIT => "Unit",
            prefix::REPORT_SIZE => "Report Size",
            prefix::REPORT_ID => "Report ID",
            prefix::REPORT_COUNT => "Report Count",
            prefix::USAGE => "Usage",
            prefix::USAGE_MINIMUM => "Usage Minimum",
            prefix::USAGE_MAXIMUM => "Usage Maximum",
            _ => "Unknown",
        }
    }

    fn is_signed(&self) -> bool {
        matches!(
            self.prefix,
            prefix::LOGICAL_MINIMUM
                | prefix::LOGICAL_MAXIMUM
                | prefix::PHYSICAL_MINIMUM
                | prefix::PHYSICAL_MAXIMUM
        )
    }

    /// One annotated listing line, e.g. `75 10       Report Size (16)`
    pub fn annotate(&self) -> String {
        let raw = std::iter::once(self.prefix | size_code(self.data.len()).unwrap_or(0))
            .chain(self.data.iter().copied())
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        match (self.data.is_empty(), self.is_signed()) {
            (true, _) => format!("{:<12}{}", raw, self.name()),
            (false, true) => format!("{:<12}{} ({})", raw, self.name(), self.signed_value()),
            (false, false) => format!("{:<12}{} (0x{:02X})", raw, self.name(), self.value()),
        }
    }
}

/// Iterator over the short items of a descriptor
///
/// Stops at the first malformed or truncated item.
pub struct ItemReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ItemReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl<'a> Iterator for ItemReader<'a> {
    type Item = Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = *self.bytes.get(self.pos)?;
        let len = match first & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let start = self.pos + 1;
        let data = self.bytes.get(start..start + len)?;
        self.pos = start + len;
        Some(Item {
            prefix: first & 0xFC,
            data,
        })
    }
}

/// Total input bits declared per report id
///
/// Tracks only the global state this crate emits (no push/pop), which is
/// enough to check a compiled descriptor against the encoder's layout.
pub fn input_bits_by_report(bytes: &[u8]) -> BTreeMap<u8, u32> {
    let mut totals = BTreeMap::new();
    let mut report_id = 0u8;
    let mut report_size = 0u32;
    let mut report_count = 0u32;

    for item in ItemReader::new(bytes) {
        match item.prefix {
            prefix::REPORT_ID => report_id = item.value() as u8,
            prefix::REPORT_SIZE => report_size = item.value(),
            prefix::REPORT_COUNT => report_count = item.value(),
            prefix::INPUT => {
                *totals.entry(report_id).or_insert(0) += report_size * report_count;
            }
            _ => {}
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_splits_items() {
        let bytes = [0x05, 0x01, 0x26, 0xFF, 0x7F, 0xC0];
        let items: Vec<Item> = ItemReader::new(&bytes).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].prefix, prefix::USAGE_PAGE);
        assert_eq!(items[1].signed_value(), 32767);
        assert_eq!(items[2].prefix, prefix::END_COLLECTION);
        assert!(items[2].data.is_empty());
    }

    #[test]
    fn test_reader_stops_on_truncated_item() {
        let bytes = [0x05, 0x01, 0x26, 0xFF];
        assert_eq!(ItemReader::new(&bytes).count(), 1);
    }

    #[test]
    fn test_signed_values() {
        let item = Item {
            prefix: prefix::LOGICAL_MINIMUM,
            data: &[0x81],
        };
        assert_eq!(item.signed_value(), -127);
        assert_eq!(item.annotate(), "15 81       Logical Minimum (-127)");
    }

    #[test]
    fn test_input_bits_by_report() {
        let bytes = [
            0x85, 0x01, 0x75, 0x01, 0x95, 0x0A, 0x81, 0x02, // 10 bits
            0x95, 0x06, 0x81, 0x03, // 6 bits padding
            0x85, 0x02, 0x75, 0x08, 0x95, 0x08, 0x81, 0x00, // 64 bits
        ];
        let totals = input_bits_by_report(&bytes);
        assert_eq!(totals[&1], 16);
        assert_eq!(totals[&2], 64);
    }
}
