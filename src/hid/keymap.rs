//! Keyboard usage codes and US-layout text mapping
//!
//! Reference: USB HID Usage Tables 1.12, Section 10 (Keyboard/Keypad Page)

/// Keyboard page usage codes (Usage Page 0x07)
pub mod usb {
    // Letters A-Z (0x04 - 0x1D)
    pub const KEY_A: u8 = 0x04;
    pub const KEY_B: u8 = 0x05;
    pub const KEY_C: u8 = 0x06;
    pub const KEY_Z: u8 = 0x1D;

    // Numbers 1-9, 0 (0x1E - 0x27)
    pub const KEY_1: u8 = 0x1E;
    pub const KEY_2: u8 = 0x1F;
    pub const KEY_3: u8 = 0x20;
    pub const KEY_4: u8 = 0x21;
    pub const KEY_5: u8 = 0x22;
    pub const KEY_6: u8 = 0x23;
    pub const KEY_7: u8 = 0x24;
    pub const KEY_8: u8 = 0x25;
    pub const KEY_9: u8 = 0x26;
    pub const KEY_0: u8 = 0x27;

    // Control keys
    pub const KEY_ENTER: u8 = 0x28;
    pub const KEY_BACKSPACE: u8 = 0x2A;
    pub const KEY_TAB: u8 = 0x2B;
    pub const KEY_SPACE: u8 = 0x2C;
    pub const KEY_MINUS: u8 = 0x2D;
    pub const KEY_EQUAL: u8 = 0x2E;
    pub const KEY_LEFT_BRACKET: u8 = 0x2F;
    pub const KEY_RIGHT_BRACKET: u8 = 0x30;
    pub const KEY_BACKSLASH: u8 = 0x31;
    pub const KEY_SEMICOLON: u8 = 0x33;
    pub const KEY_APOSTROPHE: u8 = 0x34;
    pub const KEY_GRAVE: u8 = 0x35;
    pub const KEY_COMMA: u8 = 0x36;
    pub const KEY_PERIOD: u8 = 0x37;
    pub const KEY_SLASH: u8 = 0x38;

    /// Highest code declared in the keyboard descriptor's key array
    pub const KEY_APPLICATION: u8 = 0x65;

    // Modifier keys (reported through the modifier byte)
    pub const KEY_LEFT_CTRL: u8 = 0xE0;
    pub const KEY_LEFT_SHIFT: u8 = 0xE1;
    pub const KEY_LEFT_ALT: u8 = 0xE2;
    pub const KEY_LEFT_META: u8 = 0xE3;
    pub const KEY_RIGHT_CTRL: u8 = 0xE4;
    pub const KEY_RIGHT_SHIFT: u8 = 0xE5;
    pub const KEY_RIGHT_ALT: u8 = 0xE6;
    pub const KEY_RIGHT_META: u8 = 0xE7;
}

/// Modifier byte bits
pub mod modifier {
    pub const LEFT_CTRL: u8 = 0x01;
    pub const LEFT_SHIFT: u8 = 0x02;
    pub const LEFT_ALT: u8 = 0x04;
    pub const LEFT_META: u8 = 0x08;
    pub const RIGHT_CTRL: u8 = 0x10;
    pub const RIGHT_SHIFT: u8 = 0x20;
    pub const RIGHT_ALT: u8 = 0x40;
    pub const RIGHT_META: u8 = 0x80;
}

/// Map an ASCII character to its keyboard usage code on a US layout.
///
/// Shifted symbols map to the key that produces them; pair with
/// [`needs_shift`] to get the modifier. Returns 0 for unmapped characters.
pub fn ascii_to_hid(c: char) -> u8 {
    match c {
        'a'..='z' => c as u8 - b'a' + usb::KEY_A,
        'A'..='Z' => c as u8 - b'A' + usb::KEY_A,
        '1'..='9' => c as u8 - b'1' + usb::KEY_1,
        '0' => usb::KEY_0,
        '!' => usb::KEY_1,
        '@' => usb::KEY_2,
        '#' => usb::KEY_3,
        '$' => usb::KEY_4,
        '%' => usb::KEY_5,
        '^' => usb::KEY_6,
        '&' => usb::KEY_7,
        '*' => usb::KEY_8,
        '(' => usb::KEY_9,
        ')' => usb::KEY_0,
        '-' | '_' => usb::KEY_MINUS,
        '=' | '+' => usb::KEY_EQUAL,
        '[' | '{' => usb::KEY_LEFT_BRACKET,
        ']' | '}' => usb::KEY_RIGHT_BRACKET,
        '\\' | '|' => usb::KEY_BACKSLASH,
        ';' | ':' => usb::KEY_SEMICOLON,
        '\'' | '"' => usb::KEY_APOSTROPHE,
        '`' | '~' => usb::KEY_GRAVE,
        ',' | '<' => usb::KEY_COMMA,
        '.' | '>' => usb::KEY_PERIOD,
        '/' | '?' => usb::KEY_SLASH,
        ' ' => usb::KEY_SPACE,
        '\n' | '\r' => usb::KEY_ENTER,
        '\t' => usb::KEY_TAB,
        '\u{8}' => usb::KEY_BACKSPACE,
        _ => 0,
    }
}

/// Whether typing `c` on a US layout requires Shift
pub fn needs_shift(c: char) -> bool {
    c.is_ascii_uppercase()
        || matches!(
            c,
            '!' | '@'
                | '#'
                | '$'
                | '%'
                | '^'
                | '&'
                | '*'
                | '('
                | ')'
                | '_'
                | '+'
                | '{'
                | '}'
                | '|'
                | ':'
                | '"'
                | '~'
                | '<'
                | '>'
                | '?'
        )
}

/// Get modifier bit for a modifier key
pub fn modifier_bit(usb_code: u8) -> Option<u8> {
    match usb_code {
        usb::KEY_LEFT_CTRL => Some(modifier::LEFT_CTRL),
        usb::KEY_LEFT_SHIFT => Some(modifier::LEFT_SHIFT),
        usb::KEY_LEFT_ALT => Some(modifier::LEFT_ALT),
        usb::KEY_LEFT_META => Some(modifier::LEFT_META),
        usb::KEY_RIGHT_CTRL => Some(modifier::RIGHT_CTRL),
        usb::KEY_RIGHT_SHIFT => Some(modifier::RIGHT_SHIFT),
        usb::KEY_RIGHT_ALT => Some(modifier::RIGHT_ALT),
        usb::KEY_RIGHT_META => Some(modifier::RIGHT_META),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_mapping() {
        assert_eq!(ascii_to_hid('a'), usb::KEY_A);
        assert_eq!(ascii_to_hid('Z'), usb::KEY_Z);
        assert!(needs_shift('Z'));
        assert!(!needs_shift('z'));
    }

    #[test]
    fn test_number_mapping() {
        assert_eq!(ascii_to_hid('1'), usb::KEY_1);
        assert_eq!(ascii_to_hid('9'), usb::KEY_9);
        assert_eq!(ascii_to_hid('0'), usb::KEY_0);
    }

    #[test]
    fn test_shifted_symbols_use_base_key() {
        assert_eq!(ascii_to_hid('!'), ascii_to_hid('1'));
        assert_eq!(ascii_to_hid('?'), ascii_to_hid('/'));
        assert_eq!(ascii_to_hid('"'), usb::KEY_APOSTROPHE);
        assert!(needs_shift('!'));
        assert!(needs_shift('~'));
        assert!(!needs_shift('/'));
        assert!(!needs_shift(' '));
    }

    #[test]
    fn test_whitespace_and_unmapped() {
        assert_eq!(ascii_to_hid(' '), usb::KEY_SPACE);
        assert_eq!(ascii_to_hid('\n'), usb::KEY_ENTER);
        assert_eq!(ascii_to_hid('\r'), usb::KEY_ENTER);
        assert_eq!(ascii_to_hid('\t'), usb::KEY_TAB);
        assert_eq!(ascii_to_hid('é'), 0);
    }

    #[test]
    fn test_modifier_key() {
        assert_eq!(modifier_bit(usb::KEY_LEFT_CTRL), Some(modifier::LEFT_CTRL));
        assert_eq!(modifier_bit(usb::KEY_RIGHT_SHIFT), Some(modifier::RIGHT_SHIFT));
        assert_eq!(modifier_bit(usb::KEY_RIGHT_META), Some(modifier::RIGHT_META));
        assert_eq!(modifier_bit(usb::KEY_A), None);
    }
}
