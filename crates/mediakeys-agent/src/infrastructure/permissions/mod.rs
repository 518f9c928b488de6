//! Permission providers.
//!
//! On macOS, [`macos::MacosPermissions`] asks the OS live on every call.
//! [`StaticPermissions`] holds answers set by the caller; the binary uses it
//! on platforms without an event tap and tests use it to revoke grants
//! mid-run.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::application::ports::PermissionProvider;

#[cfg(target_os = "macos")]
pub mod macos;

/// A [`PermissionProvider`] with settable answers.
#[derive(Debug)]
pub struct StaticPermissions {
    accessibility: AtomicBool,
    input_monitoring: AtomicBool,
}

impl StaticPermissions {
    /// Both grants held.
    pub fn granted() -> Self {
        Self {
            accessibility: AtomicBool::new(true),
            input_monitoring: AtomicBool::new(true),
        }
    }

    pub fn set_accessibility(&self, granted: bool) {
        self.accessibility.store(granted, Ordering::SeqCst);
    }

    pub fn set_input_monitoring(&self, granted: bool) {
        self.input_monitoring.store(granted, Ordering::SeqCst);
    }
}

impl PermissionProvider for StaticPermissions {
    fn is_automation_trust_granted(&self) -> bool {
        self.accessibility.load(Ordering::SeqCst)
    }

    fn is_input_monitoring_granted(&self) -> bool {
        self.input_monitoring.load(Ordering::SeqCst)
    }
}
