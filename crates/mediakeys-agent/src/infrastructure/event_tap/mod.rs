//! Event tap infrastructure.
//!
//! On macOS this installs a CoreGraphics event tap for system-defined events
//! (the category hardware media keys arrive in) and hosts it on a dedicated
//! CFRunLoop thread.  The tap callback can swallow an event by returning
//! nothing to the OS, which is how the system volume/brightness overlay is
//! replaced.
//!
//! # Threading (for beginners)
//!
//! An event tap is not a queue you poll.  The OS calls our callback
//! synchronously, on whichever thread owns the run loop the tap's source was
//! added to, and waits for the answer before delivering the event to anyone
//! else.  Three consequences shape the traits below:
//!
//! - The tap object lives and dies on its own thread ([`EventTap`] is not
//!   `Send`); other threads only get a [`TapControl`] that can enable,
//!   disable, and stop the loop.
//! - The callback reaches the engine through a `Weak` reference.  The OS
//!   holds the callback for as long as the tap exists, and it must never
//!   keep the engine alive on its own.
//! - Decoding the raw event into fields needs AppKit, which must run on the
//!   primary thread.  The callback therefore receives a [`NativeEvent`] it
//!   can send to that thread rather than ready-made fields.
//!
//! # Testability
//!
//! [`TapBackend`] abstracts tap creation so that [`mock::MockTapBackend`] can
//! stand in for CoreGraphics in unit and integration tests.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use mediakeys_core::RawInputEvent;
use serde::Deserialize;
use thiserror::Error;

pub mod mock;

#[cfg(target_os = "macos")]
pub mod macos;

/// Point in the OS input pipeline where a tap attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapLocation {
    /// Where HID system events enter the window server.  Sees media keys
    /// before any other process; needs the most privilege.
    Hid,
    /// Where HID and remote-control events enter a login session.
    Session,
    /// Where session events are annotated for delivery to applications.
    AnnotatedSession,
}

impl TapLocation {
    /// Default candidate order: hardware level first, then session level.
    pub const DEFAULT_ORDER: [TapLocation; 2] = [TapLocation::Hid, TapLocation::Session];

    pub fn as_str(&self) -> &'static str {
        match self {
            TapLocation::Hid => "hid",
            TapLocation::Session => "session",
            TapLocation::AnnotatedSession => "annotated_session",
        }
    }
}

impl fmt::Display for TapLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TapLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hid" => Ok(TapLocation::Hid),
            "session" => Ok(TapLocation::Session),
            "annotated_session" => Ok(TapLocation::AnnotatedSession),
            other => Err(format!("unknown tap location: {other}")),
        }
    }
}

/// Why the OS disabled a running tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapNotice {
    /// The callback overran the OS latency budget.
    DisabledByTimeout,
    /// Secure input or another privileged client turned the tap off.
    DisabledByUserInput,
}

/// An undecoded OS event captured by the tap callback.
///
/// [`NativeEvent::decode`] must be called on the primary thread.
pub trait NativeEvent: Send {
    fn decode(self: Box<Self>) -> Option<RawInputEvent>;
}

/// Something the OS delivered to the tap callback.
pub enum TapEvent {
    /// The OS disabled the tap; it stays off until re-enabled.
    Disabled(TapNotice),
    /// An input event of the tapped category.
    Input {
        /// Native event type as reported by the tap.
        category: u32,
        /// Global pointer location when the event fired.
        pointer: (f64, f64),
        native: Box<dyn NativeEvent>,
    },
}

impl fmt::Debug for TapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapEvent::Disabled(notice) => f.debug_tuple("Disabled").field(notice).finish(),
            TapEvent::Input {
                category, pointer, ..
            } => f
                .debug_struct("Input")
                .field("category", category)
                .field("pointer", pointer)
                .finish_non_exhaustive(),
        }
    }
}

/// What the callback tells the OS to do with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapVerdict {
    PassThrough,
    Suppress,
}

/// Receives every callback from a running tap.
///
/// Called on the tap thread, one event at a time, in delivery order.
pub trait TapEventHandler: Send + Sync {
    fn handle(&self, event: TapEvent) -> TapVerdict;
}

/// Thread-safe control surface of a created tap.
pub trait TapControl: Send + Sync {
    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;
    /// Makes [`EventTap::run`] return.  Safe to call from the callback.
    fn stop_loop(&self);
}

/// A created tap, owned by the thread that created it.
///
/// The owning thread calls [`activate`](EventTap::activate) once, then
/// [`run`](EventTap::run).  A tap is live from the moment `activate`
/// returns, before its loop has started spinning.
pub trait EventTap {
    fn control(&self) -> Arc<dyn TapControl>;

    /// Attaches the tap's source to this thread's loop and enables the tap.
    /// Does nothing if [`TapControl::stop_loop`] was already called.
    fn activate(&mut self);

    /// Blocks running the loop until [`TapControl::stop_loop`] is called,
    /// then disables the tap and detaches its source.
    fn run(self: Box<Self>);
}

/// Error returned when a tap cannot be created at one location.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not create tap at {location}: {reason}")]
pub struct TapCreateError {
    pub location: TapLocation,
    pub reason: String,
}

/// Creates taps.  Implemented per platform.
pub trait TapBackend: Send + Sync + 'static {
    /// Creates a tap for system-defined events at `location`.
    ///
    /// Called on the thread that will later call [`EventTap::run`].  The
    /// tap holds `handler` weakly; once the engine is dropped, callbacks
    /// pass events through untouched.
    fn create_tap(
        &self,
        location: TapLocation,
        handler: Weak<dyn TapEventHandler>,
    ) -> Result<Box<dyn EventTap>, TapCreateError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
