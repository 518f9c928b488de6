//! MediaKeyInterceptor: the input half of the tap callback.
//!
//! For each event the tap delivers, in order:
//!
//! 1. Drop anything outside the system-defined category.
//! 2. Decode the native event on the primary thread (blocking, bounded).
//! 3. [`classify`] the decoded payload.
//! 4. [`explain`] against a fresh flag snapshot and the live controllers.
//! 5. Hand any resulting controller call to the primary thread without
//!    waiting for it.
//!
//! # Latency budget
//!
//! Everything here runs inside the OS tap callback, which is disabled if it
//! takes too long (roughly a second).  Step 2 is the only blocking part and
//! is capped by `decode_timeout`; when it expires the event passes through
//! untouched.  Controller calls never run on the tap thread.

use std::cell::OnceCell;
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use mediakeys_core::classify::NS_EVENT_TYPE_SYSTEM_DEFINED;
use mediakeys_core::{
    classify, explain, ControllerAction, ControllerCall, DeviceCapability, DisplayRef,
    KeyDecision, RawInputEvent,
};
use tracing::{debug, trace, warn};

use crate::application::ports::{
    BrightnessController, DisplayLocator, ExecutorError, FeatureFlagSource, MainThreadExecutor,
    VolumeController,
};
use crate::infrastructure::event_tap::NativeEvent;

/// Default cap on the primary-thread decode round trip.
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_millis(250);

/// Outcome of [`MediaKeyInterceptor::intercept`] for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interception {
    pub decision: KeyDecision,
    /// `true` only when the decision's controller call reached the executor.
    pub dispatched: bool,
}

impl Interception {
    fn pass_through() -> Self {
        Self {
            decision: KeyDecision::PASS_THROUGH,
            dispatched: false,
        }
    }
}

/// Decides and dispatches for every tapped event.
pub struct MediaKeyInterceptor {
    volume: Arc<dyn VolumeController>,
    brightness: Arc<dyn BrightnessController>,
    flags: Arc<dyn FeatureFlagSource>,
    displays: Arc<dyn DisplayLocator>,
    executor: Arc<dyn MainThreadExecutor>,
    decode_timeout: Duration,
}

impl MediaKeyInterceptor {
    pub fn new(
        volume: Arc<dyn VolumeController>,
        brightness: Arc<dyn BrightnessController>,
        flags: Arc<dyn FeatureFlagSource>,
        displays: Arc<dyn DisplayLocator>,
        executor: Arc<dyn MainThreadExecutor>,
    ) -> Self {
        Self {
            volume,
            brightness,
            flags,
            displays,
            executor,
            decode_timeout: DEFAULT_DECODE_TIMEOUT,
        }
    }

    pub fn with_decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout = timeout;
        self
    }

    /// Processes one tapped event.  Called on the tap thread.
    pub fn intercept(
        &self,
        category: u32,
        pointer: (f64, f64),
        native: Box<dyn NativeEvent>,
    ) -> Interception {
        if category != NS_EVENT_TYPE_SYSTEM_DEFINED {
            return Interception::pass_through();
        }

        let raw = match self.decode_on_main_thread(native) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Interception::pass_through(),
            Err(err) => {
                warn!(%err, "could not decode media key event; passing through");
                return Interception::pass_through();
            }
        };

        let Some(event) = classify(&raw) else {
            return Interception::pass_through();
        };

        let flags = self.flags.snapshot();
        let caps = LiveCapability {
            volume: self.volume.as_ref(),
            brightness: self.brightness.as_ref(),
            displays: self.displays.as_ref(),
            pointer,
            target: OnceCell::new(),
        };
        let (decision, reason) = explain(&event, &caps, &flags);

        let key = event.key();
        if flags.debug_logging_enabled {
            debug!(
                ?key,
                down = event.is_key_down,
                repeat = event.is_repeat,
                ?reason,
                suppress = decision.suppress,
                "media key"
            );
        } else {
            trace!(
                ?key,
                down = event.is_key_down,
                repeat = event.is_repeat,
                ?reason,
                suppress = decision.suppress,
                "media key"
            );
        }

        let dispatched = match decision.action {
            Some(call) => self.dispatch(call),
            None => false,
        };
        Interception {
            decision,
            dispatched,
        }
    }

    /// Blocking request/response to the primary thread for the decode step.
    fn decode_on_main_thread(
        &self,
        native: Box<dyn NativeEvent>,
    ) -> Result<Option<RawInputEvent>, ExecutorError> {
        let (reply, response) = mpsc::sync_channel(1);
        self.executor.submit(Box::new(move || {
            // The requester may have timed out and gone away.
            let _ = reply.send(native.decode());
        }))?;
        response
            .recv_timeout(self.decode_timeout)
            .map_err(|err| match err {
                mpsc::RecvTimeoutError::Timeout => ExecutorError::TimedOut,
                mpsc::RecvTimeoutError::Disconnected => ExecutorError::Closed,
            })
    }

    /// Queues `call` for the primary thread.  Returns `false` if dropped.
    fn dispatch(&self, call: ControllerCall) -> bool {
        let volume = Arc::clone(&self.volume);
        let brightness = Arc::clone(&self.brightness);
        let job = Box::new(move || apply_call(volume.as_ref(), brightness.as_ref(), call));
        match self.executor.submit(job) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, action = ?call.action, "dropping controller call");
                false
            }
        }
    }
}

impl fmt::Debug for MediaKeyInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaKeyInterceptor")
            .field("decode_timeout", &self.decode_timeout)
            .finish_non_exhaustive()
    }
}

/// Runs a controller call.  Invoked on the primary thread.
pub fn apply_call(
    volume: &dyn VolumeController,
    brightness: &dyn BrightnessController,
    call: ControllerCall,
) {
    match call.action {
        ControllerAction::VolumeUp => volume.increase(call.step_divisor, call.target),
        ControllerAction::VolumeDown => volume.decrease(call.step_divisor, call.target),
        ControllerAction::ToggleMute => volume.toggle_mute(call.target),
        ControllerAction::BrightnessUp => brightness.increase(call.step_divisor, call.target),
        ControllerAction::BrightnessDown => brightness.decrease(call.step_divisor, call.target),
    }
}

/// Capability view over the live controllers for one event.
///
/// The display lookup runs at most once, and only if a rule asks for it.
struct LiveCapability<'a> {
    volume: &'a dyn VolumeController,
    brightness: &'a dyn BrightnessController,
    displays: &'a dyn DisplayLocator,
    pointer: (f64, f64),
    target: OnceCell<Option<DisplayRef>>,
}

impl DeviceCapability for LiveCapability<'_> {
    fn supports_software_volume(&self) -> bool {
        self.volume.supports_software_control()
    }

    fn brightness_requests_passthrough(&self) -> bool {
        self.brightness
            .should_passthrough_to_system(self.target_display())
    }

    fn can_address_brightness(&self) -> bool {
        self.brightness.can_handle(self.target_display())
    }

    fn target_display(&self) -> Option<DisplayRef> {
        *self
            .target
            .get_or_init(|| self.displays.display_at(self.pointer.0, self.pointer.1))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
