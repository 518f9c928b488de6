//! In-memory volume and brightness controllers.
//!
//! Real audio and display control lives outside this crate.  These
//! stand-ins keep a simulated level, log every call at `info`, and record
//! the calls so that tests can assert on exactly what the engine dispatched.
//! The binary wires them in until a real backend is injected.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use mediakeys_core::DisplayRef;
use tracing::info;

use crate::application::ports::{BrightnessController, VolumeController};

/// Size of one full step, matching the 16 steps of the system HUD.
pub const FULL_STEP: f32 = 1.0 / 16.0;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn step(step_divisor: f32) -> f32 {
    FULL_STEP / step_divisor
}

// ── Volume ────────────────────────────────────────────────────────────────────

/// A call received by [`RecordingVolume`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeCall {
    Increase {
        step_divisor: f32,
        target: Option<DisplayRef>,
    },
    Decrease {
        step_divisor: f32,
        target: Option<DisplayRef>,
    },
    ToggleMute {
        target: Option<DisplayRef>,
    },
}

#[derive(Debug)]
struct VolumeState {
    level: f32,
    muted: bool,
    calls: Vec<VolumeCall>,
}

#[derive(Debug)]
pub struct RecordingVolume {
    state: Mutex<VolumeState>,
    software_control: AtomicBool,
    capability_queries: AtomicUsize,
}

impl Default for RecordingVolume {
    fn default() -> Self {
        Self {
            state: Mutex::new(VolumeState {
                level: 0.5,
                muted: false,
                calls: Vec::new(),
            }),
            software_control: AtomicBool::new(true),
            capability_queries: AtomicUsize::new(0),
        }
    }
}

impl RecordingVolume {
    /// Simulates an output device that only accepts hardware control.
    pub fn set_software_control(&self, supported: bool) {
        self.software_control.store(supported, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<VolumeCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of `Increase` calls received.
    pub fn increases(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| matches!(c, VolumeCall::Increase { .. }))
            .count()
    }

    /// Number of times `supports_software_control` was asked.
    pub fn capability_queries(&self) -> usize {
        self.capability_queries.load(Ordering::SeqCst)
    }
}

impl VolumeController for RecordingVolume {
    fn increase(&self, step_divisor: f32, target: Option<DisplayRef>) {
        let mut state = lock(&self.state);
        state.muted = false;
        state.level = (state.level + step(step_divisor)).min(1.0);
        state.calls.push(VolumeCall::Increase {
            step_divisor,
            target,
        });
        info!(level = state.level, step_divisor, "volume up");
    }

    fn decrease(&self, step_divisor: f32, target: Option<DisplayRef>) {
        let mut state = lock(&self.state);
        state.level = (state.level - step(step_divisor)).max(0.0);
        state.calls.push(VolumeCall::Decrease {
            step_divisor,
            target,
        });
        info!(level = state.level, step_divisor, "volume down");
    }

    fn toggle_mute(&self, target: Option<DisplayRef>) {
        let mut state = lock(&self.state);
        state.muted = !state.muted;
        state.calls.push(VolumeCall::ToggleMute { target });
        info!(muted = state.muted, "mute toggled");
    }

    fn supports_software_control(&self) -> bool {
        self.capability_queries.fetch_add(1, Ordering::SeqCst);
        self.software_control.load(Ordering::SeqCst)
    }

    fn current_level(&self) -> f32 {
        lock(&self.state).level
    }

    fn is_muted(&self) -> bool {
        lock(&self.state).muted
    }
}

// ── Brightness ────────────────────────────────────────────────────────────────

/// A call received by [`RecordingBrightness`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrightnessCall {
    Increase {
        step_divisor: f32,
        target: Option<DisplayRef>,
    },
    Decrease {
        step_divisor: f32,
        target: Option<DisplayRef>,
    },
}

#[derive(Debug)]
pub struct RecordingBrightness {
    level: Mutex<f32>,
    calls: Mutex<Vec<BrightnessCall>>,
    passthrough: AtomicBool,
    handleable: AtomicBool,
}

impl Default for RecordingBrightness {
    fn default() -> Self {
        Self {
            level: Mutex::new(0.5),
            calls: Mutex::new(Vec::new()),
            passthrough: AtomicBool::new(false),
            handleable: AtomicBool::new(true),
        }
    }
}

impl RecordingBrightness {
    /// Makes every display ask for OS brightness handling.
    pub fn set_passthrough(&self, passthrough: bool) {
        self.passthrough.store(passthrough, Ordering::SeqCst);
    }

    /// Makes every display unreachable.
    pub fn set_handleable(&self, handleable: bool) {
        self.handleable.store(handleable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BrightnessCall> {
        lock(&self.calls).clone()
    }

    pub fn level(&self) -> f32 {
        *lock(&self.level)
    }
}

impl BrightnessController for RecordingBrightness {
    fn increase(&self, step_divisor: f32, target: Option<DisplayRef>) {
        let mut level = lock(&self.level);
        *level = (*level + step(step_divisor)).min(1.0);
        lock(&self.calls).push(BrightnessCall::Increase {
            step_divisor,
            target,
        });
        info!(level = *level, step_divisor, target = ?target, "brightness up");
    }

    fn decrease(&self, step_divisor: f32, target: Option<DisplayRef>) {
        let mut level = lock(&self.level);
        *level = (*level - step(step_divisor)).max(0.0);
        lock(&self.calls).push(BrightnessCall::Decrease {
            step_divisor,
            target,
        });
        info!(level = *level, step_divisor, target = ?target, "brightness down");
    }

    fn should_passthrough_to_system(&self, _target: Option<DisplayRef>) -> bool {
        self.passthrough.load(Ordering::SeqCst)
    }

    fn can_handle(&self, _target: Option<DisplayRef>) -> bool {
        self.handleable.load(Ordering::SeqCst)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
