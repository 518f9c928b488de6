//! Feature flags snapshot.
//!
//! The host application owns the authoritative flag values and may change
//! them at any time.  The engine never caches them: every routing decision
//! receives a fresh [`FeatureFlags`] snapshot.

use serde::{Deserialize, Serialize};

/// A point-in-time copy of the engine's feature switches.
///
/// Missing fields deserialize to their defaults so that a partial
/// `[features]` table in the config file is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Master switch: when off, every volume and brightness key passes through.
    #[serde(default = "default_true")]
    pub hud_replacement_enabled: bool,
    /// Replace the system HUD for volume keys.
    #[serde(default = "default_true")]
    pub volume_replacement_enabled: bool,
    /// Replace the system HUD for brightness keys.
    #[serde(default = "default_true")]
    pub brightness_replacement_enabled: bool,
    /// Always use the quarter step, regardless of held modifiers.
    #[serde(default)]
    pub fine_step_override_enabled: bool,
    /// Promote per-event decision logging from `trace` to `debug`.
    #[serde(default)]
    pub debug_logging_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            hud_replacement_enabled: true,
            volume_replacement_enabled: true,
            brightness_replacement_enabled: true,
            fine_step_override_enabled: false,
            debug_logging_enabled: false,
        }
    }
}

impl FeatureFlags {
    /// Returns flags with every replacement switch turned off.
    pub fn all_disabled() -> Self {
        Self {
            hud_replacement_enabled: false,
            volume_replacement_enabled: false,
            brightness_replacement_enabled: false,
            fine_step_override_enabled: false,
            debug_logging_enabled: false,
        }
    }

    /// `true` when both the master switch and the volume switch are on.
    pub fn replaces_volume(&self) -> bool {
        self.hud_replacement_enabled && self.volume_replacement_enabled
    }

    /// `true` when both the master switch and the brightness switch are on.
    pub fn replaces_brightness(&self) -> bool {
        self.hud_replacement_enabled && self.brightness_replacement_enabled
    }
}
