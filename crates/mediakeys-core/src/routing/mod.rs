//! Pass-through vs. suppress arbitration for classified media keys.
//!
//! [`route`] is a pure function: given a [`MediaKeyEvent`], a view of the
//! active device's capabilities, and a fresh [`FeatureFlags`] snapshot, it
//! decides whether the tap swallows the event and which controller call (if
//! any) the agent should dispatch.
//!
//! # Rule order
//!
//! 1. Transport keys (play/pause, next, previous, fast, rewind) pass through
//!    before any flag or capability is looked at.  The OS media-routing layer
//!    sits downstream of the tap and needs them untouched.
//! 2. Unrecognised key codes pass through.
//! 3. Volume keys pass through when replacement is off or the device cannot
//!    be driven in software.
//! 4. Brightness keys pass through when replacement is off, when the target
//!    display asks for OS pass-through, or when the controller cannot
//!    address it.
//! 5. Everything left is suppressed.  Only presses and auto-repeats carry a
//!    controller call; a bare release is swallowed without effect.
//!
//! Capabilities are queried through the [`DeviceCapability`] trait, lazily,
//! so rule 1 holds structurally: a transport key never reaches a capability
//! query.

use tracing::trace;

use crate::classify::MediaKeyEvent;
use crate::domain::{DisplayRef, FeatureFlags, ModifierSet};
use crate::keymap::{KeyGroup, MediaKey};

/// Per-press adjustment divisors.
pub struct StepDivisor;

impl StepDivisor {
    /// A full step.
    pub const FULL: f32 = 1.0;
    /// A quarter step ("fine" control).
    pub const QUARTER: f32 = 4.0;
}

/// Modifier combination that selects the quarter step: Shift + Option.
pub const FINE_STEP_MODIFIERS: u8 = ModifierSet::SHIFT | ModifierSet::OPTION;

/// Capability view of the device a key press targets.
///
/// Implemented by the agent over the live controllers; [`StaticCapability`]
/// is a fixed-value implementation for tests and benchmarks.
pub trait DeviceCapability {
    /// `false` when the output device must be controlled by hardware/OS.
    fn supports_software_volume(&self) -> bool;
    /// `true` when the target display asks for OS brightness handling.
    fn brightness_requests_passthrough(&self) -> bool;
    /// `false` when the brightness controller cannot reach the target display.
    fn can_address_brightness(&self) -> bool;
    /// Display under the pointer when the event fired, if known.
    fn target_display(&self) -> Option<DisplayRef>;
}

/// A [`DeviceCapability`] with fixed answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCapability {
    pub software_volume: bool,
    pub brightness_passthrough: bool,
    pub brightness_addressable: bool,
    pub target: Option<DisplayRef>,
}

impl Default for StaticCapability {
    fn default() -> Self {
        Self {
            software_volume: true,
            brightness_passthrough: false,
            brightness_addressable: true,
            target: None,
        }
    }
}

impl DeviceCapability for StaticCapability {
    fn supports_software_volume(&self) -> bool {
        self.software_volume
    }

    fn brightness_requests_passthrough(&self) -> bool {
        self.brightness_passthrough
    }

    fn can_address_brightness(&self) -> bool {
        self.brightness_addressable
    }

    fn target_display(&self) -> Option<DisplayRef> {
        self.target
    }
}

/// Controller operation selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAction {
    VolumeUp,
    VolumeDown,
    ToggleMute,
    BrightnessUp,
    BrightnessDown,
}

/// A call to hand to the external volume or brightness controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerCall {
    pub action: ControllerAction,
    pub step_divisor: f32,
    pub target: Option<DisplayRef>,
}

/// The router's output for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyDecision {
    pub suppress: bool,
    pub action: Option<ControllerCall>,
}

impl KeyDecision {
    /// Leave the event untouched.
    pub const PASS_THROUGH: KeyDecision = KeyDecision {
        suppress: false,
        action: None,
    };

    /// Swallow the event without dispatching anything.
    pub const SWALLOW: KeyDecision = KeyDecision {
        suppress: true,
        action: None,
    };

    pub fn is_pass_through(&self) -> bool {
        !self.suppress
    }
}

/// Why [`explain`] reached its decision.  Used for decision logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteReason {
    TransportKey,
    UnrecognisedKey,
    VolumeReplacementDisabled,
    NoSoftwareVolume,
    BrightnessReplacementDisabled,
    BrightnessPassthroughRequested,
    BrightnessTargetUnaddressable,
    Suppressed,
    SwallowedRelease,
}

/// Computes the step divisor for an adjustment.
///
/// The override flag forces the quarter step; otherwise the quarter step
/// needs Shift and Option held together.
pub fn step_divisor(modifiers: ModifierSet, flags: &FeatureFlags) -> f32 {
    if flags.fine_step_override_enabled || modifiers.contains(FINE_STEP_MODIFIERS) {
        StepDivisor::QUARTER
    } else {
        StepDivisor::FULL
    }
}

/// Decides pass-through vs. suppress for one classified event.
pub fn route<C: DeviceCapability + ?Sized>(
    event: &MediaKeyEvent,
    caps: &C,
    flags: &FeatureFlags,
) -> KeyDecision {
    explain(event, caps, flags).0
}

/// Like [`route`], also returning the rule that produced the decision.
pub fn explain<C: DeviceCapability + ?Sized>(
    event: &MediaKeyEvent,
    caps: &C,
    flags: &FeatureFlags,
) -> (KeyDecision, RouteReason) {
    let key = event.key();

    let action = match key.group() {
        KeyGroup::Transport => return (KeyDecision::PASS_THROUGH, RouteReason::TransportKey),
        KeyGroup::Other => return (KeyDecision::PASS_THROUGH, RouteReason::UnrecognisedKey),
        KeyGroup::Volume => {
            if !flags.replaces_volume() {
                return (
                    KeyDecision::PASS_THROUGH,
                    RouteReason::VolumeReplacementDisabled,
                );
            }
            if !caps.supports_software_volume() {
                return (KeyDecision::PASS_THROUGH, RouteReason::NoSoftwareVolume);
            }
            volume_action(key)
        }
        KeyGroup::Brightness => {
            if !flags.replaces_brightness() {
                return (
                    KeyDecision::PASS_THROUGH,
                    RouteReason::BrightnessReplacementDisabled,
                );
            }
            if caps.brightness_requests_passthrough() {
                return (
                    KeyDecision::PASS_THROUGH,
                    RouteReason::BrightnessPassthroughRequested,
                );
            }
            if !caps.can_address_brightness() {
                return (
                    KeyDecision::PASS_THROUGH,
                    RouteReason::BrightnessTargetUnaddressable,
                );
            }
            brightness_action(key)
        }
    };

    let Some(action) = action else {
        // Unreachable for the groups above; treat as unrecognised.
        return (KeyDecision::PASS_THROUGH, RouteReason::UnrecognisedKey);
    };

    if !event.is_key_down {
        trace!(key = ?key, "swallowing release of suppressed key");
        return (KeyDecision::SWALLOW, RouteReason::SwallowedRelease);
    }

    let call = ControllerCall {
        action,
        step_divisor: step_divisor(event.modifiers, flags),
        target: caps.target_display(),
    };
    (
        KeyDecision {
            suppress: true,
            action: Some(call),
        },
        RouteReason::Suppressed,
    )
}

fn volume_action(key: MediaKey) -> Option<ControllerAction> {
    match key {
        MediaKey::VolumeUp => Some(ControllerAction::VolumeUp),
        MediaKey::VolumeDown => Some(ControllerAction::VolumeDown),
        MediaKey::Mute => Some(ControllerAction::ToggleMute),
        _ => None,
    }
}

fn brightness_action(key: MediaKey) -> Option<ControllerAction> {
    match key {
        MediaKey::BrightnessUp => Some(ControllerAction::BrightnessUp),
        MediaKey::BrightnessDown => Some(ControllerAction::BrightnessDown),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
