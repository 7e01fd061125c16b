use super::MOUSE_REPORT_LEN;

/// Mouse report state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseReport {
    /// Button state
    pub buttons: u8,
    /// X movement (-127 to 127)
    pub x: i8,
    /// Y movement (-127 to 127)
    pub y: i8,
    /// Wheel movement (-127 to 127)
    pub wheel: i8,
}

impl MouseReport {
    pub fn new(buttons: u8, x: i8, y: i8, wheel: i8) -> Self {
        Self {
            buttons,
            x,
            y,
            wheel,
        }
    }

    /// Convert to the wire payload
    ///
    /// The horizontal pan byte is always 0, even when the descriptor
    /// declares the field.
    pub fn to_bytes(&self) -> [u8; MOUSE_REPORT_LEN] {
        [
            self.buttons,
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
            0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::mouse_button;

    #[test]
    fn test_fixed_five_bytes() {
        let report = MouseReport::new(mouse_button::LEFT | mouse_button::MIDDLE, -1, 5, -127);
        assert_eq!(report.to_bytes(), [0x05, 0xFF, 0x05, 0x81, 0x00]);
        assert_eq!(MouseReport::default().to_bytes(), [0; MOUSE_REPORT_LEN]);
    }
}
