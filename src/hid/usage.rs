//! HID usage pages and usage codes referenced by the report descriptor
//!
//! Reference: USB HID Usage Tables 1.12

/// Usage pages
pub mod page {
    pub const GENERIC_DESKTOP: u8 = 0x01;
    pub const SIMULATION: u8 = 0x02;
    pub const KEYBOARD: u8 = 0x07;
    pub const BUTTON: u8 = 0x09;
    pub const CONSUMER: u8 = 0x0C;
    /// Vendor-defined page 0xFF00, little-endian
    pub const VENDOR: u16 = 0xFF00;
}

/// Generic Desktop page (0x01)
pub mod desktop {
    pub const POINTER: u8 = 0x01;
    pub const MOUSE: u8 = 0x02;
    pub const KEYBOARD: u8 = 0x06;
    pub const X: u8 = 0x30;
    pub const Y: u8 = 0x31;
    pub const Z: u8 = 0x32;
    pub const RX: u8 = 0x33;
    pub const RY: u8 = 0x34;
    pub const RZ: u8 = 0x35;
    pub const SLIDER: u8 = 0x36;
    pub const WHEEL: u8 = 0x38;
    pub const HAT_SWITCH: u8 = 0x39;
    pub const START: u8 = 0x3D;
    pub const SELECT: u8 = 0x3E;
    pub const VX: u8 = 0x40;
    pub const VY: u8 = 0x41;
    pub const VZ: u8 = 0x42;
    pub const APP_MENU: u8 = 0x86;
}

/// Simulation Controls page (0x02)
pub mod simulation {
    pub const RUDDER: u8 = 0xBA;
    pub const THROTTLE: u8 = 0xBB;
    pub const ACCELERATOR: u8 = 0xC4;
    pub const BRAKE: u8 = 0xC5;
    pub const STEERING: u8 = 0xC8;
}

/// Consumer page (0x0C)
pub mod consumer {
    pub const MUTE: u16 = 0x00E2;
    pub const VOLUME_UP: u16 = 0x00E9;
    pub const VOLUME_DOWN: u16 = 0x00EA;
    pub const AC_HOME: u16 = 0x0223;
    pub const AC_BACK: u16 = 0x0224;
    pub const AC_PAN: u16 = 0x0238;
}

/// Whether a usage needs the two-byte usage item
pub fn is_extended_usage(usage: u16) -> bool {
    usage > 0xFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_usage_codes() {
        assert!(is_extended_usage(consumer::AC_HOME));
        assert!(is_extended_usage(consumer::AC_PAN));
        assert!(!is_extended_usage(consumer::MUTE));
        assert!(!is_extended_usage(consumer::VOLUME_UP));
    }
}
