//! Collaborator interfaces consumed by the interception engine.
//!
//! The engine decides *whether* a media key is handled; everything that
//! actually changes hardware state, reads OS trust grants, or runs code on
//! the primary thread sits behind one of these traits.  Infrastructure
//! provides the production implementations; tests inject recording doubles.
//!
//! All traits are `Send + Sync` because they are shared between the tap
//! thread (which queries them) and the primary thread (which runs the
//! dispatched controller calls).

use mediakeys_core::{DisplayRef, FeatureFlags};
use thiserror::Error;

/// OS trust grants required before an event tap may be created.
///
/// Both checks must be live queries: the user can revoke either grant in
/// System Settings at any moment while the engine is running.
pub trait PermissionProvider: Send + Sync {
    /// Accessibility ("automation") trust for this process.
    fn is_automation_trust_granted(&self) -> bool;
    /// Input Monitoring preflight.  Must not show a prompt.
    fn is_input_monitoring_granted(&self) -> bool;
}

/// Audio output control.  Implemented outside this crate.
pub trait VolumeController: Send + Sync {
    fn increase(&self, step_divisor: f32, target: Option<DisplayRef>);
    fn decrease(&self, step_divisor: f32, target: Option<DisplayRef>);
    fn toggle_mute(&self, target: Option<DisplayRef>);
    /// `false` when the output device only accepts hardware volume control.
    fn supports_software_control(&self) -> bool;
    fn current_level(&self) -> f32;
    fn is_muted(&self) -> bool;
}

/// Display brightness control.  Implemented outside this crate.
pub trait BrightnessController: Send + Sync {
    fn increase(&self, step_divisor: f32, target: Option<DisplayRef>);
    fn decrease(&self, step_divisor: f32, target: Option<DisplayRef>);
    /// `true` when the target display should be left to the OS, e.g. for
    /// compatibility with a third-party brightness tool.
    fn should_passthrough_to_system(&self, target: Option<DisplayRef>) -> bool;
    fn can_handle(&self, target: Option<DisplayRef>) -> bool;
}

/// Read-only access to the live feature flags.
pub trait FeatureFlagSource: Send + Sync {
    /// Returns a fresh snapshot.  Called once per routed event.
    fn snapshot(&self) -> FeatureFlags;
}

impl FeatureFlagSource for FeatureFlags {
    fn snapshot(&self) -> FeatureFlags {
        *self
    }
}

/// Resolves a global pointer location to the display under it.
pub trait DisplayLocator: Send + Sync {
    fn display_at(&self, x: f64, y: f64) -> Option<DisplayRef>;
}

/// Locator used where no display information is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplays;

impl DisplayLocator for NoDisplays {
    fn display_at(&self, _x: f64, _y: f64) -> Option<DisplayRef> {
        None
    }
}

/// A unit of work to run on the primary (UI) thread.
pub type MainThreadJob = Box<dyn FnOnce() + Send + 'static>;

/// Error type for primary-thread hand-offs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutorError {
    /// The primary-thread loop has shut down and accepts no more work.
    #[error("primary-thread executor is closed")]
    Closed,
    /// A synchronous hand-off did not complete within its budget.
    #[error("primary-thread hand-off timed out")]
    TimedOut,
}

/// Queue onto the process's primary thread.
///
/// `submit` never blocks and never runs the job inline on a background
/// thread; callers that need the result build their own reply channel.
pub trait MainThreadExecutor: Send + Sync {
    fn submit(&self, job: MainThreadJob) -> Result<(), ExecutorError>;
}
