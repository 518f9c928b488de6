//! Live feature flags shared between the host and the tap callback.
//!
//! The host (settings UI, config reload) writes; the interceptor takes a
//! fresh [`FeatureFlags`] snapshot for every event.  Each flag is its own
//! atomic, so a snapshot taken during an update may mix old and new values
//! of *different* flags.  That is acceptable: every flag is independent.

use std::sync::atomic::{AtomicBool, Ordering};

use mediakeys_core::FeatureFlags;

use crate::application::ports::FeatureFlagSource;

#[derive(Debug, Default)]
pub struct SharedFeatureFlags {
    hud_replacement: AtomicBool,
    volume_replacement: AtomicBool,
    brightness_replacement: AtomicBool,
    fine_step_override: AtomicBool,
    debug_logging: AtomicBool,
}

impl SharedFeatureFlags {
    pub fn new(initial: FeatureFlags) -> Self {
        let flags = Self::default();
        flags.replace(initial);
        flags
    }

    /// Overwrites every flag.
    pub fn replace(&self, flags: FeatureFlags) {
        self.hud_replacement
            .store(flags.hud_replacement_enabled, Ordering::Relaxed);
        self.volume_replacement
            .store(flags.volume_replacement_enabled, Ordering::Relaxed);
        self.brightness_replacement
            .store(flags.brightness_replacement_enabled, Ordering::Relaxed);
        self.fine_step_override
            .store(flags.fine_step_override_enabled, Ordering::Relaxed);
        self.debug_logging
            .store(flags.debug_logging_enabled, Ordering::Relaxed);
    }

    pub fn set_hud_replacement(&self, enabled: bool) {
        self.hud_replacement.store(enabled, Ordering::Relaxed);
    }

    pub fn set_volume_replacement(&self, enabled: bool) {
        self.volume_replacement.store(enabled, Ordering::Relaxed);
    }

    pub fn set_brightness_replacement(&self, enabled: bool) {
        self.brightness_replacement.store(enabled, Ordering::Relaxed);
    }

    pub fn set_fine_step_override(&self, enabled: bool) {
        self.fine_step_override.store(enabled, Ordering::Relaxed);
    }

    pub fn set_debug_logging(&self, enabled: bool) {
        self.debug_logging.store(enabled, Ordering::Relaxed);
    }
}

impl FeatureFlagSource for SharedFeatureFlags {
    fn snapshot(&self) -> FeatureFlags {
        FeatureFlags {
            hud_replacement_enabled: self.hud_replacement.load(Ordering::Relaxed),
            volume_replacement_enabled: self.volume_replacement.load(Ordering::Relaxed),
            brightness_replacement_enabled: self.brightness_replacement.load(Ordering::Relaxed),
            fine_step_override_enabled: self.fine_step_override.load(Ordering::Relaxed),
            debug_logging_enabled: self.debug_logging.load(Ordering::Relaxed),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_initial_flags() {
        let initial = FeatureFlags {
            fine_step_override_enabled: true,
            ..FeatureFlags::default()
        };
        assert_eq!(SharedFeatureFlags::new(initial).snapshot(), initial);
    }

    #[test]
    fn test_setters_are_visible_in_next_snapshot() {
        // Arrange
        let flags = SharedFeatureFlags::new(FeatureFlags::default());

        // Act
        flags.set_volume_replacement(false);
        flags.set_debug_logging(true);

        // Assert
        let snapshot = flags.snapshot();
        assert!(!snapshot.volume_replacement_enabled);
        assert!(snapshot.debug_logging_enabled);
        assert!(snapshot.hud_replacement_enabled);
    }

    #[test]
    fn test_replace_overwrites_everything() {
        let flags = SharedFeatureFlags::new(FeatureFlags::default());
        flags.replace(FeatureFlags::all_disabled());
        assert_eq!(flags.snapshot(), FeatureFlags::all_disabled());
    }
}
