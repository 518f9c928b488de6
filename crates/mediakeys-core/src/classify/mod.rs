//! Classification of raw system-defined events into media key events.
//!
//! # Payload layout
//!
//! Auxiliary control button events pack everything into the low 32 bits of
//! the event's `data1` field:
//!
//! ```text
//!  31             16 15      8 7       1 0
//! +-----------------+---------+---------+-+
//! |    key code     |  state  | (unused)|R|
//! +-----------------+---------+---------+-+
//!                   |<------ key flags ----->|
//! ```
//!
//! - key code: `NX_KEYTYPE_*` value (see [`crate::keymap`])
//! - state: `0x0A` or `0x08` pressed, `0x0B` released
//! - R: auto-repeat bit
//!
//! Events of any other category or subtype are not errors; [`classify`]
//! returns `None` and the caller passes them through untouched.

use crate::domain::ModifierSet;
use crate::keymap::MediaKey;

/// `NSEventTypeSystemDefined`: the only event category the engine taps.
pub const NS_EVENT_TYPE_SYSTEM_DEFINED: u32 = 14;

/// `NX_SUBTYPE_AUX_CONTROL_BUTTONS`: media keys on Apple and HID keyboards.
pub const NX_SUBTYPE_AUX_CONTROL_BUTTONS: i16 = 8;

/// Key state reported on press.
pub const KEY_STATE_DOWN: u8 = 0x0A;
/// Alternate press state emitted by some external keyboards.
pub const KEY_STATE_DOWN_ALT: u8 = 0x08;
/// Key state reported on release.
pub const KEY_STATE_UP: u8 = 0x0B;

/// A decoded, OS-neutral view of one hardware event delivered to the tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInputEvent {
    /// Native event type (`NSEventType` raw value).
    pub category: u32,
    /// Native event subtype.
    pub subtype: i16,
    /// First payload word; only the low 32 bits are meaningful.
    pub data1: i64,
    /// Modifier keys held when the event was generated.
    pub modifiers: ModifierSet,
}

impl RawInputEvent {
    /// Builds an auxiliary-control-button event from its parts.
    ///
    /// Used by tests and by the mock tap backend to synthesise media keys.
    pub fn aux_button(key_code: u32, state: u8, repeat: bool, modifiers: ModifierSet) -> Self {
        let flags = (u32::from(state) << 8) | u32::from(repeat);
        Self {
            category: NS_EVENT_TYPE_SYSTEM_DEFINED,
            subtype: NX_SUBTYPE_AUX_CONTROL_BUTTONS,
            data1: i64::from((key_code << 16) | flags),
            modifiers,
        }
    }
}

/// Semantic key state decoded from bits 8–15 of the key flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Down,
    Up,
    /// Any other state byte; neither a press nor a release.
    Other(u8),
}

impl KeyState {
    fn from_byte(state: u8) -> Self {
        match state {
            KEY_STATE_DOWN | KEY_STATE_DOWN_ALT => KeyState::Down,
            KEY_STATE_UP => KeyState::Up,
            other => KeyState::Other(other),
        }
    }
}

/// A classified media key event.  Transient; produced per hardware event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaKeyEvent {
    pub key_code: u32,
    /// `(down OR repeat) AND NOT up`: whether this event should act.
    pub is_key_down: bool,
    pub is_repeat: bool,
    pub modifiers: ModifierSet,
    pub state: KeyState,
}

impl MediaKeyEvent {
    pub fn key(&self) -> MediaKey {
        MediaKey::from_code(self.key_code)
    }
}

/// Classifies a raw event.
///
/// Returns `None` for anything that is not an auxiliary control button
/// event, meaning "pass through untouched".
pub fn classify(raw: &RawInputEvent) -> Option<MediaKeyEvent> {
    if raw.category != NS_EVENT_TYPE_SYSTEM_DEFINED {
        return None;
    }
    if raw.subtype != NX_SUBTYPE_AUX_CONTROL_BUTTONS {
        return None;
    }

    let payload = (raw.data1 as u64 & 0xFFFF_FFFF) as u32;
    let key_code = (payload & 0xFFFF_0000) >> 16;
    let key_flags = payload & 0x0000_FFFF;
    let state = KeyState::from_byte(((key_flags & 0xFF00) >> 8) as u8);
    let is_repeat = key_flags & 0x1 == 0x1;

    let is_down_state = state == KeyState::Down;
    let is_up_state = state == KeyState::Up;

    Some(MediaKeyEvent {
        key_code,
        is_key_down: (is_down_state || is_repeat) && !is_up_state,
        is_repeat,
        modifiers: raw.modifiers,
        state,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{NX_KEYTYPE_MUTE, NX_KEYTYPE_SOUND_UP};

    #[test]
    fn test_classify_key_down_state_0a() {
        // Arrange
        let raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x0A, false, ModifierSet::empty());

        // Act
        let event = classify(&raw).expect("aux button must classify");

        // Assert
        assert_eq!(event.key(), MediaKey::VolumeUp);
        assert!(event.is_key_down);
        assert!(!event.is_repeat);
        assert_eq!(event.state, KeyState::Down);
    }

    #[test]
    fn test_classify_alternate_down_state_08() {
        let raw = RawInputEvent::aux_button(NX_KEYTYPE_MUTE, 0x08, false, ModifierSet::empty());
        let event = classify(&raw).unwrap();
        assert!(event.is_key_down);
        assert_eq!(event.state, KeyState::Down);
    }

    #[test]
    fn test_classify_key_up_state_0b() {
        let raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x0B, false, ModifierSet::empty());
        let event = classify(&raw).unwrap();
        assert!(!event.is_key_down);
        assert_eq!(event.state, KeyState::Up);
    }

    #[test]
    fn test_classify_repeat_bit_counts_as_down() {
        let raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x0A, true, ModifierSet::empty());
        let event = classify(&raw).unwrap();
        assert!(event.is_key_down);
        assert!(event.is_repeat);
    }

    #[test]
    fn test_classify_repeat_with_unknown_state_is_down() {
        let raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x00, true, ModifierSet::empty());
        let event = classify(&raw).unwrap();
        assert!(event.is_key_down);
        assert_eq!(event.state, KeyState::Other(0x00));
    }

    #[test]
    fn test_classify_repeat_bit_on_up_state_is_not_down() {
        let raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x0B, true, ModifierSet::empty());
        let event = classify(&raw).unwrap();
        assert!(!event.is_key_down);
    }

    #[test]
    fn test_classify_ignores_other_categories() {
        let mut raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x0A, false, ModifierSet::empty());
        raw.category = 10; // NSEventTypeKeyDown
        assert!(classify(&raw).is_none());
    }

    #[test]
    fn test_classify_ignores_other_subtypes() {
        let mut raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x0A, false, ModifierSet::empty());
        raw.subtype = 7; // NX_SUBTYPE_POWER_KEY-class event
        assert!(classify(&raw).is_none());
    }

    #[test]
    fn test_classify_ignores_high_bits_of_data1() {
        let mut raw = RawInputEvent::aux_button(NX_KEYTYPE_MUTE, 0x0A, false, ModifierSet::empty());
        raw.data1 |= 0x7FFF_0000_0000_0000;
        let event = classify(&raw).unwrap();
        assert_eq!(event.key(), MediaKey::Mute);
    }

    #[test]
    fn test_classify_carries_modifiers() {
        let mods = ModifierSet::empty().with(ModifierSet::SHIFT | ModifierSet::OPTION);
        let raw = RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, 0x0A, false, mods);
        assert_eq!(classify(&raw).unwrap().modifiers, mods);
    }
}
