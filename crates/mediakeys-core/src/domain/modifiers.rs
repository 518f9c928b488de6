//! Modifier key bit set.
//!
//! The native masks below are shared by `CGEventFlags` and
//! `NSEvent.modifierFlags`, so either source converts with
//! [`ModifierSet::from_native`].

/// `NSEventModifierFlagCapsLock` / `kCGEventFlagMaskAlphaShift`
pub const NATIVE_CAPS_LOCK: u64 = 1 << 16;
/// `NSEventModifierFlagShift` / `kCGEventFlagMaskShift`
pub const NATIVE_SHIFT: u64 = 1 << 17;
/// `NSEventModifierFlagControl` / `kCGEventFlagMaskControl`
pub const NATIVE_CONTROL: u64 = 1 << 18;
/// `NSEventModifierFlagOption` / `kCGEventFlagMaskAlternate`
pub const NATIVE_OPTION: u64 = 1 << 19;
/// `NSEventModifierFlagCommand` / `kCGEventFlagMaskCommand`
pub const NATIVE_COMMAND: u64 = 1 << 20;
/// `NSEventModifierFlagFunction` / `kCGEventFlagMaskSecondaryFn`
pub const NATIVE_FUNCTION: u64 = 1 << 23;

/// Set of modifier keys held while a media key event was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ModifierSet(pub u8);

impl ModifierSet {
    pub const SHIFT: u8 = 1 << 0;
    pub const CONTROL: u8 = 1 << 1;
    pub const OPTION: u8 = 1 << 2;
    pub const COMMAND: u8 = 1 << 3;
    pub const CAPS_LOCK: u8 = 1 << 4;
    pub const FUNCTION: u8 = 1 << 5;

    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Converts a native modifier mask into a [`ModifierSet`].
    ///
    /// Device-dependent bits (left/right distinctions, the low 16 bits) are
    /// ignored.
    pub fn from_native(native: u64) -> Self {
        let mut bits = 0u8;
        if native & NATIVE_SHIFT != 0 {
            bits |= Self::SHIFT;
        }
        if native & NATIVE_CONTROL != 0 {
            bits |= Self::CONTROL;
        }
        if native & NATIVE_OPTION != 0 {
            bits |= Self::OPTION;
        }
        if native & NATIVE_COMMAND != 0 {
            bits |= Self::COMMAND;
        }
        if native & NATIVE_CAPS_LOCK != 0 {
            bits |= Self::CAPS_LOCK;
        }
        if native & NATIVE_FUNCTION != 0 {
            bits |= Self::FUNCTION;
        }
        Self(bits)
    }

    /// Returns a copy with the given bits added.
    pub const fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }

    /// Returns `true` if every bit in `bits` is set.
    pub fn contains(&self, bits: u8) -> bool {
        self.0 & bits == bits
    }

    pub fn shift(&self) -> bool {
        self.contains(Self::SHIFT)
    }

    pub fn option(&self) -> bool {
        self.contains(Self::OPTION)
    }

    pub fn caps_lock(&self) -> bool {
        self.contains(Self::CAPS_LOCK)
    }
}
