//! # mediakeys-core
//!
//! Pure decision logic for the media key interception engine: naming the
//! auxiliary key codes, classifying raw system-defined events, and deciding
//! per key whether the event tap passes it through or swallows it.
//!
//! This crate has zero dependencies on OS APIs.  The agent crate feeds it
//! decoded [`RawInputEvent`]s from the event tap and acts on the returned
//! [`KeyDecision`].
//!
//! # Architecture overview (for beginners)
//!
//! Hardware media keys travel through the operating system as
//! *system-defined* events.  The agent installs a privileged event tap that
//! sees each one before the OS draws its own volume or brightness overlay.
//! For every event the tap asks two questions, both answered here:
//!
//! - **`classify`** – Is this a media key at all, and if so which key, is it
//!   a press, a release, or an auto-repeat?
//!
//! - **`routing`** – Given that key, the live feature flags, and what the
//!   current audio/display device supports, should the tap swallow the event
//!   and adjust the level itself, or let the OS handle it as usual?
//!
//! Supporting modules:
//!
//! - **`keymap`** – The `NX_KEYTYPE_*` key codes and their grouping into
//!   volume, brightness, and transport keys.
//! - **`domain`** – Feature flags, modifier sets, and display references.

pub mod classify;
pub mod domain;
pub mod keymap;
pub mod routing;

pub use classify::{classify, KeyState, MediaKeyEvent, RawInputEvent};
pub use domain::{DisplayRef, FeatureFlags, ModifierSet};
pub use keymap::{KeyGroup, MediaKey};
pub use routing::{
    explain, route, step_divisor, ControllerAction, ControllerCall, DeviceCapability,
    KeyDecision, RouteReason, StaticCapability, StepDivisor,
};
