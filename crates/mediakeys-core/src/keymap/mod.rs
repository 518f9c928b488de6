//! Auxiliary media key codes carried by system-defined hardware events.
//!
//! Media keys do not produce ordinary key-down/key-up events.  The keyboard
//! firmware reports them as *system-defined* events whose payload carries a
//! small integer identifying the key (the `NX_KEYTYPE_*` constants from
//! IOKit's `ev_keymap.h`).  This module gives those integers names and sorts
//! them into the groups the router cares about.
//!
//! # Key groups (for beginners)
//!
//! | Group        | Keys                                   | Engine behaviour             |
//! |--------------|----------------------------------------|------------------------------|
//! | `Volume`     | sound up, sound down, mute             | may be suppressed            |
//! | `Brightness` | brightness up, brightness down         | may be suppressed            |
//! | `Transport`  | play, next, previous, fast, rewind     | always passed through        |
//! | `Other`      | everything else (keyboard backlight…)  | always passed through        |

/// `NX_KEYTYPE_SOUND_UP`
pub const NX_KEYTYPE_SOUND_UP: u32 = 0;
/// `NX_KEYTYPE_SOUND_DOWN`
pub const NX_KEYTYPE_SOUND_DOWN: u32 = 1;
/// `NX_KEYTYPE_BRIGHTNESS_UP`
pub const NX_KEYTYPE_BRIGHTNESS_UP: u32 = 2;
/// `NX_KEYTYPE_BRIGHTNESS_DOWN`
pub const NX_KEYTYPE_BRIGHTNESS_DOWN: u32 = 3;
/// `NX_KEYTYPE_MUTE`
pub const NX_KEYTYPE_MUTE: u32 = 7;
/// `NX_KEYTYPE_PLAY`
pub const NX_KEYTYPE_PLAY: u32 = 16;
/// `NX_KEYTYPE_NEXT`
pub const NX_KEYTYPE_NEXT: u32 = 17;
/// `NX_KEYTYPE_PREVIOUS`
pub const NX_KEYTYPE_PREVIOUS: u32 = 18;
/// `NX_KEYTYPE_FAST`
pub const NX_KEYTYPE_FAST: u32 = 19;
/// `NX_KEYTYPE_REWIND`
pub const NX_KEYTYPE_REWIND: u32 = 20;

/// A media key identified from a system-defined event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKey {
    VolumeUp,
    VolumeDown,
    Mute,
    BrightnessUp,
    BrightnessDown,
    Play,
    Next,
    Previous,
    Fast,
    Rewind,
    /// Any auxiliary key code the engine does not recognise.
    Unknown(u32),
}

/// Coarse grouping used by the routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGroup {
    Volume,
    Brightness,
    Transport,
    Other,
}

impl MediaKey {
    /// Maps a raw `NX_KEYTYPE_*` code to a [`MediaKey`].
    ///
    /// Never fails: unrecognised codes become [`MediaKey::Unknown`].
    pub fn from_code(code: u32) -> Self {
        match code {
            NX_KEYTYPE_SOUND_UP => MediaKey::VolumeUp,
            NX_KEYTYPE_SOUND_DOWN => MediaKey::VolumeDown,
            NX_KEYTYPE_MUTE => MediaKey::Mute,
            NX_KEYTYPE_BRIGHTNESS_UP => MediaKey::BrightnessUp,
            NX_KEYTYPE_BRIGHTNESS_DOWN => MediaKey::BrightnessDown,
            NX_KEYTYPE_PLAY => MediaKey::Play,
            NX_KEYTYPE_NEXT => MediaKey::Next,
            NX_KEYTYPE_PREVIOUS => MediaKey::Previous,
            NX_KEYTYPE_FAST => MediaKey::Fast,
            NX_KEYTYPE_REWIND => MediaKey::Rewind,
            other => MediaKey::Unknown(other),
        }
    }

    /// Returns the raw `NX_KEYTYPE_*` code for this key.
    pub fn code(self) -> u32 {
        match self {
            MediaKey::VolumeUp => NX_KEYTYPE_SOUND_UP,
            MediaKey::VolumeDown => NX_KEYTYPE_SOUND_DOWN,
            MediaKey::Mute => NX_KEYTYPE_MUTE,
            MediaKey::BrightnessUp => NX_KEYTYPE_BRIGHTNESS_UP,
            MediaKey::BrightnessDown => NX_KEYTYPE_BRIGHTNESS_DOWN,
            MediaKey::Play => NX_KEYTYPE_PLAY,
            MediaKey::Next => NX_KEYTYPE_NEXT,
            MediaKey::Previous => NX_KEYTYPE_PREVIOUS,
            MediaKey::Fast => NX_KEYTYPE_FAST,
            MediaKey::Rewind => NX_KEYTYPE_REWIND,
            MediaKey::Unknown(code) => code,
        }
    }

    pub fn group(self) -> KeyGroup {
        match self {
            MediaKey::VolumeUp | MediaKey::VolumeDown | MediaKey::Mute => KeyGroup::Volume,
            MediaKey::BrightnessUp | MediaKey::BrightnessDown => KeyGroup::Brightness,
            MediaKey::Play
            | MediaKey::Next
            | MediaKey::Previous
            | MediaKey::Fast
            | MediaKey::Rewind => KeyGroup::Transport,
            MediaKey::Unknown(_) => KeyGroup::Other,
        }
    }

    /// Returns `true` for play/pause, next, previous and the seek keys.
    pub fn is_transport(self) -> bool {
        self.group() == KeyGroup::Transport
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
