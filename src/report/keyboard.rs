use super::KEYBOARD_REPORT_LEN;
use crate::config::MAX_KEYBOARD_KEYS;

const KEY_SLOTS: usize = MAX_KEYBOARD_KEYS as usize;

/// Keyboard report state (8 bytes on the wire)
///
/// Keys stay in press order. Releasing a key shifts the later keys down
/// one slot so the array never has holes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardReport {
    /// Modifier byte
    pub modifiers: u8,
    /// Key codes, zero-filled after the last pressed key
    keys: [u8; KEY_SLOTS],
    /// Slots the configuration allows
    slots: usize,
}

impl Default for KeyboardReport {
    fn default() -> Self {
        Self::with_slots(KEY_SLOTS)
    }
}

impl KeyboardReport {
    /// Report that accepts at most `slots` keys (clamped to 1..=6)
    pub fn with_slots(slots: usize) -> Self {
        Self {
            modifiers: 0,
            keys: [0; KEY_SLOTS],
            slots: slots.clamp(1, KEY_SLOTS),
        }
    }

    pub fn keys(&self) -> &[u8; KEY_SLOTS] {
        &self.keys
    }

    /// Convert to the wire payload
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_LEN] {
        let mut bytes = [0u8; KEYBOARD_REPORT_LEN];
        bytes[0] = self.modifiers;
        bytes[2..].copy_from_slice(&self.keys);
        bytes
    }

    /// Add a key to the first free slot
    ///
    /// Returns false if the key was already down or every slot is taken.
    pub fn add_key(&mut self, key: u8) -> bool {
        let active = &mut self.keys[..self.slots];
        if key == 0 || active.contains(&key) {
            return false;
        }
        match active.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = key;
                true
            }
            None => false,
        }
    }

    /// Remove a key and compact the remaining ones
    pub fn remove_key(&mut self, key: u8) -> bool {
        let Some(pos) = self.keys.iter().position(|slot| *slot == key && key != 0) else {
            return false;
        };
        self.keys.copy_within(pos + 1.., pos);
        self.keys[KEY_SLOTS - 1] = 0;
        true
    }

    /// Clear all keys and modifiers
    pub fn clear(&mut self) {
        self.modifiers = 0;
        self.keys = [0; KEY_SLOTS];
    }
}
