//! EventTapManager: lifecycle of the single privileged event tap.
//!
//! # Lifecycle
//!
//! ```text
//!  start()                           tap thread "mediakeys-tap"
//!    │ PermissionGate::check_ready
//!    │ spawn ───────────────────────▶ for location in candidates:
//!    │                                   backend.create_tap(location)
//!    │                                   tap.activate()  (source + enable)
//!    │ wait (startup_timeout) ◀──────── publish(location, control)
//!    │ store ActiveTap                  tap.run()  ── callbacks ──▶ handle()
//!    ▼                                      │
//!  stop()                                   │
//!    │ take ActiveTap                       │
//!    │ control.set_enabled(false)           │
//!    │ control.stop_loop() ───────────────▶ run() returns, tap dropped
//!    │ join (unless on the tap thread)
//! ```
//!
//! Exactly one [`ActiveTap`] exists while running.  It lives behind a mutex
//! that is never held while joining the tap thread, so `stop()` is safe to
//! call from inside the tap's own callback.
//!
//! # Tap-disabled recovery
//!
//! The OS disables a tap whose callback overruns its latency budget and
//! tells the callback so.  Before re-enabling, the manager re-checks the
//! [`PermissionGate`]: a tap whose trust was revoked is stopped instead,
//! since re-enabling it fights the OS input subsystem.  The timeout path
//! fires routinely and logs at `debug`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::interceptor::MediaKeyInterceptor;
use crate::application::permission_gate::{Grant, PermissionError, PermissionGate};
use crate::application::ports::PermissionProvider;
use crate::infrastructure::event_tap::{
    EventTap, TapBackend, TapControl, TapEvent, TapEventHandler, TapLocation, TapNotice,
    TapVerdict,
};

/// Name of the thread that hosts the tap's run loop.
pub const TAP_THREAD_NAME: &str = "mediakeys-tap";

/// Default wait for the tap thread to report creation.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Error type for [`EventTapManager::start`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TapError {
    #[error("{0} permission has not been granted")]
    PermissionDenied(Grant),
    #[error("could not create an event tap at any of {attempted:?}")]
    CreationFailed { attempted: Vec<TapLocation> },
    #[error("failed to spawn the tap thread: {0}")]
    LoopSpawnFailed(String),
    #[error("the tap thread did not report within the startup timeout")]
    StartupTimedOut,
}

impl From<PermissionError> for TapError {
    fn from(err: PermissionError) -> Self {
        TapError::PermissionDenied(err.grant())
    }
}

/// Outcome of a tap-disabled notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDisruption {
    /// Permission still held; the tap was re-enabled in place.
    Transient,
    /// Permission revoked; the engine stopped itself.
    PermissionRevoked,
}

/// Tap creation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TapSettings {
    /// Candidate locations in priority order.
    pub locations: Vec<TapLocation>,
    pub startup_timeout: Duration,
}

impl Default for TapSettings {
    fn default() -> Self {
        Self {
            locations: TapLocation::DEFAULT_ORDER.to_vec(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

/// Counters since the manager was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TapStats {
    pub events_seen: u64,
    pub events_suppressed: u64,
    pub actions_dispatched: u64,
    pub transient_reenables: u64,
    pub revocation_stops: u64,
}

#[derive(Default)]
struct TapCounters {
    events_seen: AtomicU64,
    events_suppressed: AtomicU64,
    actions_dispatched: AtomicU64,
    transient_reenables: AtomicU64,
    revocation_stops: AtomicU64,
}

impl TapCounters {
    fn snapshot(&self) -> TapStats {
        TapStats {
            events_seen: self.events_seen.load(Ordering::Relaxed),
            events_suppressed: self.events_suppressed.load(Ordering::Relaxed),
            actions_dispatched: self.actions_dispatched.load(Ordering::Relaxed),
            transient_reenables: self.transient_reenables.load(Ordering::Relaxed),
            revocation_stops: self.revocation_stops.load(Ordering::Relaxed),
        }
    }
}

/// The live tap handle.  At most one exists.
struct ActiveTap {
    control: Arc<dyn TapControl>,
    location: TapLocation,
    thread: JoinHandle<()>,
    thread_id: ThreadId,
}

type StartupResult = Result<(TapLocation, Arc<dyn TapControl>), TapError>;

enum StartupState {
    Pending,
    Ready(StartupResult),
    Abandoned,
}

/// Rendezvous between `start()` and the tap thread.
///
/// Either the thread publishes first and `start()` collects the result, or
/// `start()` gives up first and the thread discards its tap.  Both sides
/// decide under the same lock, so a tap can never be left running unowned.
struct StartupSlot {
    state: Mutex<StartupState>,
    ready: Condvar,
}

impl StartupSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(StartupState::Pending),
            ready: Condvar::new(),
        }
    }

    /// Returns `false` if `start()` already gave up.
    fn publish(&self, result: StartupResult) -> bool {
        let mut state = lock(&self.state);
        if matches!(*state, StartupState::Abandoned) {
            return false;
        }
        *state = StartupState::Ready(result);
        self.ready.notify_all();
        true
    }

    fn wait(&self, timeout: Duration) -> StartupResult {
        let guard = lock(&self.state);
        let (mut state, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |s| matches!(s, StartupState::Pending))
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match std::mem::replace(&mut *state, StartupState::Abandoned) {
            StartupState::Ready(result) => result,
            StartupState::Pending | StartupState::Abandoned => Err(TapError::StartupTimedOut),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared state reachable from both the public handle and the tap callback.
struct ManagerInner {
    backend: Arc<dyn TapBackend>,
    gate: PermissionGate,
    interceptor: MediaKeyInterceptor,
    settings: TapSettings,
    active: Mutex<Option<ActiveTap>>,
    running: AtomicBool,
    counters: TapCounters,
}

impl ManagerInner {
    fn stop(&self) {
        let Some(active) = lock(&self.active).take() else {
            debug!("stop requested while not running");
            return;
        };
        self.running.store(false, Ordering::SeqCst);

        // Disable first so no new callback begins.
        active.control.set_enabled(false);
        active.control.stop_loop();

        if active.thread_id == thread::current().id() {
            // Called from the callback; the loop exits once it returns.
            drop(active.thread);
        } else if active.thread.join().is_err() {
            error!("tap thread panicked");
        }
        info!(location = %active.location, "media key tap stopped");
    }

    fn recover(&self, notice: TapNotice) -> Option<TapDisruption> {
        let active = lock(&self.active);
        let Some(tap) = active.as_ref() else {
            return None;
        };

        match self.gate.check_ready() {
            Ok(()) => {
                tap.control.set_enabled(true);
                drop(active);
                self.counters
                    .transient_reenables
                    .fetch_add(1, Ordering::Relaxed);
                debug!(?notice, "event tap re-enabled");
                Some(TapDisruption::Transient)
            }
            Err(err) => {
                drop(active);
                self.counters.revocation_stops.fetch_add(1, Ordering::Relaxed);
                warn!(?notice, %err, "permission revoked while running; stopping tap");
                self.stop();
                Some(TapDisruption::PermissionRevoked)
            }
        }
    }
}

impl TapEventHandler for ManagerInner {
    fn handle(&self, event: TapEvent) -> TapVerdict {
        match event {
            TapEvent::Disabled(notice) => {
                self.recover(notice);
                TapVerdict::PassThrough
            }
            TapEvent::Input {
                category,
                pointer,
                native,
            } => {
                if !self.running.load(Ordering::SeqCst) {
                    return TapVerdict::PassThrough;
                }
                self.counters.events_seen.fetch_add(1, Ordering::Relaxed);
                let outcome = self.interceptor.intercept(category, pointer, native);
                let decision = outcome.decision;
                if outcome.dispatched {
                    self.counters
                        .actions_dispatched
                        .fetch_add(1, Ordering::Relaxed);
                }
                if decision.suppress {
                    self.counters
                        .events_suppressed
                        .fetch_add(1, Ordering::Relaxed);
                    TapVerdict::Suppress
                } else {
                    TapVerdict::PassThrough
                }
            }
        }
    }
}

/// Owns the event tap.  Dropping the manager stops the tap.
pub struct EventTapManager {
    inner: Arc<ManagerInner>,
}

impl EventTapManager {
    pub fn new(
        backend: Arc<dyn TapBackend>,
        permissions: Arc<dyn PermissionProvider>,
        interceptor: MediaKeyInterceptor,
        settings: TapSettings,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                backend,
                gate: PermissionGate::new(permissions),
                interceptor,
                settings,
                active: Mutex::new(None),
                running: AtomicBool::new(false),
                counters: TapCounters::default(),
            }),
        }
    }

    /// Creates and starts the tap.  A no-op returning `Ok` when running.
    ///
    /// Failures are not retried; call again once the user has fixed the
    /// cause (usually a missing grant).
    pub fn start(&self) -> Result<(), TapError> {
        let mut active = lock(&self.inner.active);
        if active.is_some() {
            debug!("start requested while already running");
            return Ok(());
        }

        if let Err(err) = self.inner.gate.check_ready() {
            warn!(%err, "not starting media key tap");
            return Err(err.into());
        }

        let slot = Arc::new(StartupSlot::new());
        let thread = {
            let backend = Arc::clone(&self.inner.backend);
            let locations = self.inner.settings.locations.clone();
            let inner: Arc<dyn TapEventHandler> = self.inner.clone();
            let handler = Arc::downgrade(&inner);
            let slot = Arc::clone(&slot);
            thread::Builder::new()
                .name(TAP_THREAD_NAME.to_string())
                .spawn(move || run_tap_thread(backend.as_ref(), &locations, handler, &slot))
                .map_err(|e| {
                    error!(error = %e, "failed to spawn tap thread");
                    TapError::LoopSpawnFailed(e.to_string())
                })?
        };

        match slot.wait(self.inner.settings.startup_timeout) {
            Ok((location, control)) => {
                let thread_id = thread.thread().id();
                *active = Some(ActiveTap {
                    control,
                    location,
                    thread,
                    thread_id,
                });
                self.inner.running.store(true, Ordering::SeqCst);
                info!(%location, "media key tap started");
                Ok(())
            }
            Err(TapError::StartupTimedOut) => {
                // The thread discards its tap when it eventually reports.
                error!(
                    timeout_ms = self.inner.settings.startup_timeout.as_millis() as u64,
                    "tap thread did not report in time"
                );
                Err(TapError::StartupTimedOut)
            }
            Err(err) => {
                let _ = thread.join();
                error!(%err, "failed to create media key tap");
                Err(err)
            }
        }
    }

    /// Tears the tap down.  A no-op when not running; callable from any
    /// thread including the tap's own callback.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.active).is_some()
    }

    /// Location the running tap attached at.
    pub fn active_location(&self) -> Option<TapLocation> {
        lock(&self.inner.active).as_ref().map(|tap| tap.location)
    }

    pub fn stats(&self) -> TapStats {
        self.inner.counters.snapshot()
    }

    /// Handles a tap-disabled notification as the callback would.
    ///
    /// Returns `None` when the manager is not running.
    pub fn handle_disabled(&self, notice: TapNotice) -> Option<TapDisruption> {
        self.inner.recover(notice)
    }
}

impl Drop for EventTapManager {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

impl fmt::Debug for EventTapManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTapManager")
            .field("location", &self.active_location())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Body of the tap thread: create, report, run.
fn run_tap_thread(
    backend: &dyn TapBackend,
    locations: &[TapLocation],
    handler: Weak<dyn TapEventHandler>,
    slot: &StartupSlot,
) {
    let mut created: Option<(TapLocation, Box<dyn EventTap>)> = None;
    for &location in locations {
        match backend.create_tap(location, handler.clone()) {
            Ok(tap) => {
                created = Some((location, tap));
                break;
            }
            Err(err) => debug!(%err, "tap location unavailable"),
        }
    }

    let Some((location, mut tap)) = created else {
        slot.publish(Err(TapError::CreationFailed {
            attempted: locations.to_vec(),
        }));
        return;
    };

    // Live before `start()` hears about it.
    tap.activate();
    let control = tap.control();
    if !slot.publish(Ok((location, Arc::clone(&control)))) {
        debug!(%location, "startup abandoned; discarding tap");
        control.set_enabled(false);
        control.stop_loop();
    }
    tap.run();
    debug!(%location, "tap loop exited");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ExecutorError, MainThreadExecutor, MainThreadJob, NoDisplays};
    use crate::infrastructure::controllers::{RecordingBrightness, RecordingVolume};
    use crate::infrastructure::event_tap::mock::MockTapBackend;
    use crate::infrastructure::main_thread::InlineExecutor;
    use crate::infrastructure::permissions::StaticPermissions;
    use mediakeys_core::classify::KEY_STATE_DOWN;
    use mediakeys_core::keymap::{NX_KEYTYPE_PLAY, NX_KEYTYPE_SOUND_UP};
    use mediakeys_core::{FeatureFlags, ModifierSet, RawInputEvent};
    use mockall::mock;
    use std::sync::atomic::AtomicUsize;

    mock! {
        Permissions {}
        impl PermissionProvider for Permissions {
            fn is_automation_trust_granted(&self) -> bool;
            fn is_input_monitoring_granted(&self) -> bool;
        }
    }

    struct Fixture {
        backend: Arc<MockTapBackend>,
        permissions: Arc<StaticPermissions>,
        volume: Arc<RecordingVolume>,
        manager: EventTapManager,
    }

    /// Runs the decode job inline, then refuses every controller call.
    #[derive(Default)]
    struct ClosingExecutor {
        submitted: AtomicUsize,
    }

    impl MainThreadExecutor for ClosingExecutor {
        fn submit(&self, job: MainThreadJob) -> Result<(), ExecutorError> {
            if self.submitted.fetch_add(1, Ordering::SeqCst) == 0 {
                job();
                Ok(())
            } else {
                Err(ExecutorError::Closed)
            }
        }
    }

    fn fixture_with(backend: MockTapBackend, settings: TapSettings) -> Fixture {
        fixture_with_executor(backend, settings, Arc::new(InlineExecutor))
    }

    fn fixture_with_executor(
        backend: MockTapBackend,
        settings: TapSettings,
        executor: Arc<dyn MainThreadExecutor>,
    ) -> Fixture {
        let backend = Arc::new(backend);
        let permissions = Arc::new(StaticPermissions::granted());
        let volume = Arc::new(RecordingVolume::default());
        let interceptor = MediaKeyInterceptor::new(
            Arc::clone(&volume) as _,
            Arc::new(RecordingBrightness::default()),
            Arc::new(FeatureFlags::default()),
            Arc::new(NoDisplays),
            executor,
        );
        let manager = EventTapManager::new(
            Arc::clone(&backend) as _,
            Arc::clone(&permissions) as _,
            interceptor,
            settings,
        );
        Fixture {
            backend,
            permissions,
            volume,
            manager,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockTapBackend::new(), TapSettings::default())
    }

    fn volume_up() -> RawInputEvent {
        RawInputEvent::aux_button(NX_KEYTYPE_SOUND_UP, KEY_STATE_DOWN, false, ModifierSet::empty())
    }

    // ── Start / stop ──────────────────────────────────────────────────────────

    #[test]
    fn test_start_uses_first_candidate_location() {
        // Arrange
        let f = fixture();

        // Act
        let result = f.manager.start();

        // Assert
        assert_eq!(result, Ok(()));
        assert!(f.manager.is_running());
        assert_eq!(f.manager.active_location(), Some(TapLocation::Hid));
        assert_eq!(f.backend.attempts(), vec![TapLocation::Hid]);
    }

    #[test]
    fn test_start_falls_back_to_next_location() {
        let f = fixture_with(
            MockTapBackend::new().failing_at(&[TapLocation::Hid]),
            TapSettings::default(),
        );

        f.manager.start().unwrap();

        assert_eq!(f.manager.active_location(), Some(TapLocation::Session));
        assert_eq!(
            f.backend.attempts(),
            vec![TapLocation::Hid, TapLocation::Session]
        );
    }

    #[test]
    fn test_start_reports_creation_failed_when_all_locations_fail() {
        let f = fixture_with(
            MockTapBackend::new().failing_at(&[TapLocation::Hid, TapLocation::Session]),
            TapSettings::default(),
        );

        let err = f.manager.start().unwrap_err();

        assert_eq!(
            err,
            TapError::CreationFailed {
                attempted: vec![TapLocation::Hid, TapLocation::Session]
            }
        );
        assert!(!f.manager.is_running());
    }

    #[test]
    fn test_start_twice_keeps_a_single_tap() {
        let f = fixture();

        assert_eq!(f.manager.start(), Ok(()));
        assert_eq!(f.manager.start(), Ok(()));

        assert_eq!(f.backend.created_count(), 1);
    }

    #[test]
    fn test_start_denied_does_not_attempt_creation() {
        let f = fixture();
        f.permissions.set_input_monitoring(false);

        let err = f.manager.start().unwrap_err();

        assert_eq!(err, TapError::PermissionDenied(Grant::InputMonitoring));
        assert!(f.backend.attempts().is_empty());
    }

    #[test]
    fn test_start_denied_by_mocked_provider() {
        let mut provider = MockPermissions::new();
        provider.expect_is_automation_trust_granted().return_const(false);
        provider.expect_is_input_monitoring_granted().never();
        let backend = Arc::new(MockTapBackend::new());
        let manager = EventTapManager::new(
            Arc::clone(&backend) as _,
            Arc::new(provider),
            MediaKeyInterceptor::new(
                Arc::new(RecordingVolume::default()),
                Arc::new(RecordingBrightness::default()),
                Arc::new(FeatureFlags::default()),
                Arc::new(NoDisplays),
                Arc::new(InlineExecutor),
            ),
            TapSettings::default(),
        );

        assert_eq!(
            manager.start(),
            Err(TapError::PermissionDenied(Grant::Accessibility))
        );
        assert_eq!(backend.created_count(), 0);
    }

    #[test]
    fn test_start_times_out_when_tap_thread_is_slow() {
        let f = fixture_with(
            MockTapBackend::new().with_creation_delay(Duration::from_millis(300)),
            TapSettings {
                startup_timeout: Duration::from_millis(20),
                ..TapSettings::default()
            },
        );

        assert_eq!(f.manager.start(), Err(TapError::StartupTimedOut));
        assert!(!f.manager.is_running());

        // The late tap is discarded rather than left running.
        thread::sleep(Duration::from_millis(500));
        assert_eq!(f.backend.running_count(), 0);
    }

    #[test]
    fn test_stop_when_not_running_is_noop() {
        let f = fixture();
        f.manager.stop();
        f.manager.stop();
        assert!(!f.manager.is_running());
    }

    #[test]
    fn test_stop_disables_tap_and_ends_loop() {
        let f = fixture();
        f.manager.start().unwrap();
        assert_eq!(f.backend.inject(volume_up()), Some(TapVerdict::Suppress));

        f.manager.stop();

        assert!(!f.manager.is_running());
        assert!(!f.backend.is_enabled());
        assert_eq!(f.backend.running_count(), 0);
        assert_eq!(f.backend.inject(volume_up()), None);
    }

    #[test]
    fn test_restart_after_stop_creates_new_tap() {
        let f = fixture();
        f.manager.start().unwrap();
        f.manager.stop();

        f.manager.start().unwrap();

        assert_eq!(f.backend.created_count(), 2);
        assert_eq!(f.backend.running_count(), 1);
    }

    #[test]
    fn test_drop_stops_tap() {
        let f = fixture();
        f.manager.start().unwrap();
        let backend = Arc::clone(&f.backend);

        drop(f);

        assert_eq!(backend.running_count(), 0);
    }

    // ── Event handling ────────────────────────────────────────────────────────

    #[test]
    fn test_stats_count_suppressed_and_passed_events() {
        let f = fixture();
        f.manager.start().unwrap();

        f.backend.inject(volume_up());
        f.backend.inject(RawInputEvent::aux_button(
            NX_KEYTYPE_PLAY,
            KEY_STATE_DOWN,
            false,
            ModifierSet::empty(),
        ));

        let stats = f.manager.stats();
        assert_eq!(stats.events_seen, 2);
        assert_eq!(stats.events_suppressed, 1);
        assert_eq!(stats.actions_dispatched, 1);
        assert_eq!(f.volume.increases(), 1);
    }

    #[test]
    fn test_rejected_dispatch_is_not_counted() {
        // Arrange
        let f = fixture_with_executor(
            MockTapBackend::new(),
            TapSettings::default(),
            Arc::new(ClosingExecutor::default()),
        );
        f.manager.start().unwrap();

        // Act
        let verdict = f.backend.inject(volume_up());

        // Assert
        assert_eq!(verdict, Some(TapVerdict::Suppress));
        let stats = f.manager.stats();
        assert_eq!(stats.events_seen, 1);
        assert_eq!(stats.events_suppressed, 1);
        assert_eq!(stats.actions_dispatched, 0);
        assert_eq!(f.volume.increases(), 0);
    }

    // ── Recovery ──────────────────────────────────────────────────────────────

    #[test]
    fn test_timeout_with_permission_reenables_tap() {
        let f = fixture();
        f.manager.start().unwrap();

        assert!(f.backend.disable_by_timeout());

        assert!(f.backend.is_enabled());
        assert!(f.manager.is_running());
        assert_eq!(f.manager.stats().transient_reenables, 1);
        assert_eq!(f.backend.inject(volume_up()), Some(TapVerdict::Suppress));
    }

    #[test]
    fn test_disabled_after_revocation_stops_engine() {
        let f = fixture();
        f.manager.start().unwrap();
        f.permissions.set_accessibility(false);

        assert!(f.backend.disable_by_user_input());

        assert!(!f.manager.is_running());
        assert!(!f.backend.is_enabled());
        assert_eq!(f.manager.stats().revocation_stops, 1);
        assert_eq!(f.backend.inject(volume_up()), None);
        assert_eq!(f.volume.increases(), 0);
    }

    #[test]
    fn test_timeout_delivered_on_tap_thread_reenables_tap() {
        let f = fixture();
        f.manager.start().unwrap();

        assert!(f.backend.disable_on_tap_thread(TapNotice::DisabledByTimeout));

        assert!(f.manager.is_running());
        assert!(f.backend.is_enabled());
        assert_eq!(f.manager.stats().transient_reenables, 1);
        assert_eq!(f.backend.inject(volume_up()), Some(TapVerdict::Suppress));
    }

    #[test]
    fn test_revocation_delivered_on_tap_thread_stops_without_join() {
        // Arrange
        let f = fixture();
        f.manager.start().unwrap();
        f.permissions.set_accessibility(false);

        // Act
        let delivered = f.backend.disable_on_tap_thread(TapNotice::DisabledByUserInput);

        // Assert
        assert!(delivered, "tap thread stopped itself without returning");
        assert!(!f.manager.is_running());
        assert_eq!(f.manager.active_location(), None);
        assert_eq!(f.manager.stats().revocation_stops, 1);
        assert_eq!(f.backend.running_count(), 0);
        assert_eq!(f.backend.inject(volume_up()), None);

        // The detached thread left nothing behind that blocks a restart.
        f.permissions.set_accessibility(true);
        f.manager.start().unwrap();
        assert_eq!(f.backend.created_count(), 2);
        assert_eq!(f.backend.running_count(), 1);
    }

    #[test]
    fn test_handle_disabled_when_not_running_is_ignored() {
        let f = fixture();
        assert_eq!(f.manager.handle_disabled(TapNotice::DisabledByTimeout), None);
    }

    #[test]
    fn test_handle_disabled_reports_disruption_kind() {
        let f = fixture();
        f.manager.start().unwrap();

        assert_eq!(
            f.manager.handle_disabled(TapNotice::DisabledByTimeout),
            Some(TapDisruption::Transient)
        );
        f.permissions.set_input_monitoring(false);
        assert_eq!(
            f.manager.handle_disabled(TapNotice::DisabledByTimeout),
            Some(TapDisruption::PermissionRevoked)
        );
        assert!(!f.manager.is_running());
    }
}
