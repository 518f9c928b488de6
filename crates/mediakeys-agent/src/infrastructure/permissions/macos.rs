//! macOS permission queries.
//!
//! - Accessibility: `AXIsProcessTrusted`, re-queried on every call.
//! - Input Monitoring: `CGPreflightListenEventAccess` (10.15+), which never
//!   shows a prompt.
//!
//! Both grants are tied to the bundle identifier, so a rebuilt unsigned
//! binary may need to be re-added in System Settings.

use core_foundation::base::{CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::string::CFString;
use tracing::info;

use crate::application::ports::PermissionProvider;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFTypeRef) -> bool;
}

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGPreflightListenEventAccess() -> bool;
}

/// Live OS permission provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacosPermissions;

impl MacosPermissions {
    /// Asks the OS to show the Accessibility prompt if trust is missing.
    ///
    /// Returns the trust state at the time of the call; granting in the
    /// dialog takes effect later.
    pub fn request_accessibility_prompt(&self) -> bool {
        let key = CFString::new("AXTrustedCheckOptionPrompt");
        let value = CFBoolean::true_value();
        let options = CFDictionary::from_CFType_pairs(&[(key.as_CFType(), value.as_CFType())]);

        // SAFETY: `options` is a valid CFDictionary that outlives the call.
        let trusted =
            unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef() as CFTypeRef) };
        info!(trusted, "requested accessibility prompt");
        trusted
    }
}

impl PermissionProvider for MacosPermissions {
    fn is_automation_trust_granted(&self) -> bool {
        // SAFETY: no arguments; safe from any thread.
        unsafe { AXIsProcessTrusted() }
    }

    fn is_input_monitoring_granted(&self) -> bool {
        // SAFETY: no arguments; does not prompt.
        unsafe { CGPreflightListenEventAccess() }
    }
}
