//! Mock tap backend for unit and integration testing.
//!
//! Stands in for CoreGraphics: taps are created on the engine's tap thread
//! exactly as real ones are, and [`MockTap::run`] blocks that thread until
//! the loop is stopped.  Tests then play the OS with
//! [`MockTapBackend::inject`] and [`MockTapBackend::disable_by_timeout`],
//! which call the handler on the test's own thread, or with
//! [`MockTapBackend::disable_on_tap_thread`], which has the tap thread
//! deliver the notice from inside its loop as CoreGraphics does.
//!
//! Like the OS, the mock delivers nothing to a tap that is disabled or whose
//! loop has stopped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use std::thread;
use std::time::Duration;

use mediakeys_core::RawInputEvent;

use super::{
    EventTap, NativeEvent, TapBackend, TapControl, TapCreateError, TapEvent, TapEventHandler,
    TapLocation, TapNotice, TapVerdict,
};

/// How long the OS-side helpers wait for a freshly started loop.
const LOOP_START_WAIT: Duration = Duration::from_secs(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An already-decoded event posing as a native one.
pub struct MockNativeEvent(pub RawInputEvent);

impl NativeEvent for MockNativeEvent {
    fn decode(self: Box<Self>) -> Option<RawInputEvent> {
        Some(self.0)
    }
}

#[derive(Debug, Default)]
struct LoopState {
    running: bool,
    stopped: bool,
    /// Notices waiting for the tap thread to deliver.
    pending: VecDeque<TapNotice>,
    /// Notices the tap thread has finished delivering.
    delivered: usize,
}

/// Shared state of one mock tap.
struct MockTapState {
    handler: Weak<dyn TapEventHandler>,
    enabled: AtomicBool,
    loop_state: Mutex<LoopState>,
    loop_changed: Condvar,
}

impl MockTapState {
    /// Waits until the tap is activated (or was stopped before that).
    fn is_live(&self) -> bool {
        let guard = lock(&self.loop_state);
        let (guard, _) = self
            .loop_changed
            .wait_timeout_while(guard, LOOP_START_WAIT, |s| !s.running && !s.stopped)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.running && !guard.stopped
    }

    fn deliver(&self, notice: TapNotice) {
        if let Some(handler) = self.handler.upgrade() {
            handler.handle(TapEvent::Disabled(notice));
        }
    }
}

impl TapControl for MockTapState {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn stop_loop(&self) {
        lock(&self.loop_state).stopped = true;
        self.loop_changed.notify_all();
    }
}

/// A mock tap, owned by the engine's tap thread.
pub struct MockTap {
    state: Arc<MockTapState>,
}

impl EventTap for MockTap {
    fn control(&self) -> Arc<dyn TapControl> {
        Arc::clone(&self.state) as Arc<dyn TapControl>
    }

    fn activate(&mut self) {
        let state = &self.state;
        {
            let mut loop_state = lock(&state.loop_state);
            if loop_state.stopped {
                return;
            }
            state.enabled.store(true, Ordering::SeqCst);
            loop_state.running = true;
        }
        state.loop_changed.notify_all();
    }

    fn run(self: Box<Self>) {
        let state = &self.state;
        let mut guard = lock(&state.loop_state);
        loop {
            guard = state
                .loop_changed
                .wait_while(guard, |s| !s.stopped && s.pending.is_empty())
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if guard.stopped {
                break;
            }
            let Some(notice) = guard.pending.pop_front() else {
                continue;
            };
            // The handler may stop this very loop, so it runs unlocked.
            drop(guard);
            state.deliver(notice);
            guard = lock(&state.loop_state);
            guard.delivered += 1;
            state.loop_changed.notify_all();
        }
        // Undelivered notices count as handled so no waiter hangs.
        guard.delivered += guard.pending.len();
        guard.pending.clear();
        guard.running = false;
        drop(guard);
        state.enabled.store(false, Ordering::SeqCst);
        state.loop_changed.notify_all();
    }
}

/// A [`TapBackend`] that records every creation attempt.
#[derive(Default)]
pub struct MockTapBackend {
    failing: Vec<TapLocation>,
    creation_delay: Option<Duration>,
    attempts: Mutex<Vec<TapLocation>>,
    taps: Mutex<Vec<Arc<MockTapState>>>,
    pointer: Mutex<(f64, f64)>,
}

impl MockTapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes tap creation fail at the given locations.
    pub fn failing_at(mut self, locations: &[TapLocation]) -> Self {
        self.failing.extend_from_slice(locations);
        self
    }

    /// Makes every creation attempt sleep first, to exercise startup timeouts.
    pub fn with_creation_delay(mut self, delay: Duration) -> Self {
        self.creation_delay = Some(delay);
        self
    }

    /// Locations tried so far, in order.
    pub fn attempts(&self) -> Vec<TapLocation> {
        lock(&self.attempts).clone()
    }

    /// Number of taps successfully created.
    pub fn created_count(&self) -> usize {
        lock(&self.taps).len()
    }

    /// Number of taps whose loop is currently running.
    pub fn running_count(&self) -> usize {
        lock(&self.taps)
            .iter()
            .filter(|tap| {
                let state = lock(&tap.loop_state);
                state.running && !state.stopped
            })
            .count()
    }

    /// Whether the most recently created tap is enabled.
    pub fn is_enabled(&self) -> bool {
        lock(&self.taps)
            .last()
            .map(|tap| tap.is_enabled())
            .unwrap_or(false)
    }

    /// Sets the pointer location reported with injected events.
    pub fn set_pointer(&self, x: f64, y: f64) {
        *lock(&self.pointer) = (x, y);
    }

    /// Delivers `raw` to the live tap as the OS would.
    ///
    /// Returns `None` when no enabled tap is running, i.e. the event would
    /// have reached the system untouched without any callback.
    pub fn inject(&self, raw: RawInputEvent) -> Option<TapVerdict> {
        let tap = self.live_tap()?;
        if !tap.is_enabled() {
            return None;
        }
        let handler = tap.handler.upgrade()?;
        let pointer = *lock(&self.pointer);
        Some(handler.handle(TapEvent::Input {
            category: raw.category,
            pointer,
            native: Box::new(MockNativeEvent(raw)),
        }))
    }

    /// Disables the live tap and notifies it, as the OS does after a
    /// callback overruns its budget.  Returns `false` if no tap was live.
    pub fn disable_by_timeout(&self) -> bool {
        self.disable(TapNotice::DisabledByTimeout)
    }

    /// Like [`disable_by_timeout`](Self::disable_by_timeout) for secure input.
    pub fn disable_by_user_input(&self) -> bool {
        self.disable(TapNotice::DisabledByUserInput)
    }

    /// Disables the live tap and has the tap thread deliver `notice` from
    /// inside its loop, the way CoreGraphics calls back.  Waits for the
    /// handler to return; `false` if no tap was live or delivery timed out.
    pub fn disable_on_tap_thread(&self, notice: TapNotice) -> bool {
        let Some(tap) = self.live_tap() else {
            return false;
        };
        tap.set_enabled(false);
        let mut guard = lock(&tap.loop_state);
        let target = guard.delivered + guard.pending.len() + 1;
        guard.pending.push_back(notice);
        tap.loop_changed.notify_all();
        let (guard, timeout) = tap
            .loop_changed
            .wait_timeout_while(guard, LOOP_START_WAIT, |s| s.delivered < target)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(guard);
        !timeout.timed_out()
    }

    fn disable(&self, notice: TapNotice) -> bool {
        let Some(tap) = self.live_tap() else {
            return false;
        };
        tap.set_enabled(false);
        let Some(handler) = tap.handler.upgrade() else {
            return false;
        };
        handler.handle(TapEvent::Disabled(notice));
        true
    }

    fn live_tap(&self) -> Option<Arc<MockTapState>> {
        let newest = lock(&self.taps).last().cloned()?;
        newest.is_live().then_some(newest)
    }
}

impl TapBackend for MockTapBackend {
    fn create_tap(
        &self,
        location: TapLocation,
        handler: Weak<dyn TapEventHandler>,
    ) -> Result<Box<dyn EventTap>, TapCreateError> {
        if let Some(delay) = self.creation_delay {
            thread::sleep(delay);
        }
        lock(&self.attempts).push(location);
        if self.failing.contains(&location) {
            return Err(TapCreateError {
                location,
                reason: "mock creation failure".to_string(),
            });
        }
        let state = Arc::new(MockTapState {
            handler,
            enabled: AtomicBool::new(false),
            loop_state: Mutex::new(LoopState::default()),
            loop_changed: Condvar::new(),
        });
        lock(&self.taps).push(Arc::clone(&state));
        Ok(Box::new(MockTap { state }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
