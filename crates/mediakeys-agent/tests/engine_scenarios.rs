//! End-to-end scenarios for the interception engine.
//!
//! These tests drive `EventTapManager` through the public API the way the
//! OS would: the mock backend plays the role of the system event tap,
//! `StaticPermissions` the privacy database, and the recording controllers
//! stand in for the audio and display layers.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use mediakeys_agent::application::ports::{DisplayLocator, MainThreadExecutor};
use mediakeys_agent::infrastructure::controllers::{
    BrightnessCall, RecordingBrightness, RecordingVolume, VolumeCall,
};
use mediakeys_agent::infrastructure::event_tap::mock::MockTapBackend;
use mediakeys_agent::infrastructure::event_tap::{TapLocation, TapNotice, TapVerdict};
use mediakeys_agent::infrastructure::main_thread::{main_thread_channel, InlineExecutor};
use mediakeys_agent::infrastructure::permissions::StaticPermissions;
use mediakeys_agent::{
    EventTapManager, Grant, MediaKeyInterceptor, SharedFeatureFlags, TapError, TapSettings,
};
use mediakeys_core::classify::{KEY_STATE_DOWN, KEY_STATE_UP};
use mediakeys_core::keymap::{
    NX_KEYTYPE_BRIGHTNESS_UP, NX_KEYTYPE_MUTE, NX_KEYTYPE_NEXT, NX_KEYTYPE_PLAY,
    NX_KEYTYPE_SOUND_DOWN, NX_KEYTYPE_SOUND_UP,
};
use mediakeys_core::{DisplayRef, FeatureFlags, ModifierSet, RawInputEvent};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Puts display 1 left of x = 1920 and display 2 right of it.
struct SideBySide;

impl DisplayLocator for SideBySide {
    fn display_at(&self, x: f64, _y: f64) -> Option<DisplayRef> {
        if x < 1920.0 {
            Some(DisplayRef(1))
        } else {
            Some(DisplayRef(2))
        }
    }
}

struct Engine {
    backend: Arc<MockTapBackend>,
    permissions: Arc<StaticPermissions>,
    volume: Arc<RecordingVolume>,
    brightness: Arc<RecordingBrightness>,
    flags: Arc<SharedFeatureFlags>,
    manager: EventTapManager,
}

fn engine_with(backend: MockTapBackend, executor: Arc<dyn MainThreadExecutor>) -> Engine {
    let backend = Arc::new(backend);
    let permissions = Arc::new(StaticPermissions::granted());
    let volume = Arc::new(RecordingVolume::default());
    let brightness = Arc::new(RecordingBrightness::default());
    let flags = Arc::new(SharedFeatureFlags::new(FeatureFlags::default()));
    let interceptor = MediaKeyInterceptor::new(
        Arc::clone(&volume) as _,
        Arc::clone(&brightness) as _,
        Arc::clone(&flags) as _,
        Arc::new(SideBySide),
        executor,
    )
    .with_decode_timeout(Duration::from_millis(50));
    let manager = EventTapManager::new(
        Arc::clone(&backend) as _,
        Arc::clone(&permissions) as _,
        interceptor,
        TapSettings::default(),
    );
    Engine {
        backend,
        permissions,
        volume,
        brightness,
        flags,
        manager,
    }
}

fn engine() -> Engine {
    engine_with(MockTapBackend::new(), Arc::new(InlineExecutor))
}

fn press(key_code: u32) -> RawInputEvent {
    RawInputEvent::aux_button(key_code, KEY_STATE_DOWN, false, ModifierSet::empty())
}

fn release(key_code: u32) -> RawInputEvent {
    RawInputEvent::aux_button(key_code, KEY_STATE_UP, false, ModifierSet::empty())
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn test_engine_starts_at_preferred_location_and_suppresses_volume_up() {
    // Arrange
    let e = engine();

    // Act
    e.manager.start().expect("start must succeed with grants present");
    let verdict = e.backend.inject(press(NX_KEYTYPE_SOUND_UP));

    // Assert
    assert_eq!(e.manager.active_location(), Some(TapLocation::Hid));
    assert_eq!(verdict, Some(TapVerdict::Suppress));
    assert_eq!(
        e.volume.calls(),
        vec![VolumeCall::Increase {
            step_divisor: 1.0,
            target: Some(DisplayRef(1)),
        }]
    );
}

#[test]
fn test_double_start_leaves_a_single_tap() {
    let e = engine();

    e.manager.start().unwrap();
    e.manager.start().unwrap();

    assert_eq!(e.backend.created_count(), 1);
    assert_eq!(e.backend.running_count(), 1);
}

#[test]
fn test_stop_when_not_running_is_a_no_op() {
    let e = engine();

    e.manager.stop();

    assert!(!e.manager.is_running());
    assert!(e.backend.attempts().is_empty());
}

#[test]
fn test_stopped_engine_lets_events_reach_the_system() {
    // Arrange
    let e = engine();
    e.manager.start().unwrap();

    // Act
    e.manager.stop();
    let verdict = e.backend.inject(press(NX_KEYTYPE_SOUND_UP));

    // Assert
    assert_eq!(verdict, None);
    assert_eq!(e.backend.running_count(), 0);
    assert!(e.volume.calls().is_empty());
}

#[test]
fn test_start_without_input_monitoring_creates_no_tap() {
    let e = engine();
    e.permissions.set_input_monitoring(false);

    let result = e.manager.start();

    assert_eq!(result, Err(TapError::PermissionDenied(Grant::InputMonitoring)));
    assert!(e.backend.attempts().is_empty());
}

#[test]
fn test_every_location_failing_reports_attempts_in_order() {
    let e = engine_with(
        MockTapBackend::new().failing_at(&[TapLocation::Hid, TapLocation::Session]),
        Arc::new(InlineExecutor),
    );

    let result = e.manager.start();

    assert_eq!(
        result,
        Err(TapError::CreationFailed {
            attempted: vec![TapLocation::Hid, TapLocation::Session],
        })
    );
    assert!(!e.manager.is_running());
}

// ── Routing through the live tap ──────────────────────────────────────────────

#[test]
fn test_transport_keys_pass_through_untouched() {
    let e = engine();
    e.manager.start().unwrap();

    for code in [NX_KEYTYPE_PLAY, NX_KEYTYPE_NEXT] {
        assert_eq!(e.backend.inject(press(code)), Some(TapVerdict::PassThrough));
    }

    assert!(e.volume.calls().is_empty());
    assert!(e.brightness.calls().is_empty());
}

#[test]
fn test_release_is_swallowed_without_a_controller_call() {
    let e = engine();
    e.manager.start().unwrap();

    let verdict = e.backend.inject(release(NX_KEYTYPE_SOUND_DOWN));

    assert_eq!(verdict, Some(TapVerdict::Suppress));
    assert!(e.volume.calls().is_empty());
}

#[test]
fn test_fine_step_modifiers_select_quarter_step() {
    let e = engine();
    e.manager.start().unwrap();
    let modifiers = ModifierSet::empty().with(ModifierSet::SHIFT | ModifierSet::OPTION);

    e.backend.inject(RawInputEvent::aux_button(
        NX_KEYTYPE_SOUND_DOWN,
        KEY_STATE_DOWN,
        false,
        modifiers,
    ));

    assert_eq!(
        e.volume.calls(),
        vec![VolumeCall::Decrease {
            step_divisor: 4.0,
            target: Some(DisplayRef(1)),
        }]
    );
}

#[test]
fn test_brightness_targets_display_under_pointer() {
    let e = engine();
    e.manager.start().unwrap();
    e.backend.set_pointer(2500.0, 300.0);

    let verdict = e.backend.inject(press(NX_KEYTYPE_BRIGHTNESS_UP));

    assert_eq!(verdict, Some(TapVerdict::Suppress));
    assert_eq!(
        e.brightness.calls(),
        vec![BrightnessCall::Increase {
            step_divisor: 1.0,
            target: Some(DisplayRef(2)),
        }]
    );
}

#[test]
fn test_flag_change_applies_to_the_next_event() {
    // Arrange
    let e = engine();
    e.manager.start().unwrap();
    assert_eq!(
        e.backend.inject(press(NX_KEYTYPE_MUTE)),
        Some(TapVerdict::Suppress)
    );

    // Act
    e.flags.set_volume_replacement(false);
    let verdict = e.backend.inject(press(NX_KEYTYPE_MUTE));

    // Assert
    assert_eq!(verdict, Some(TapVerdict::PassThrough));
    assert_eq!(e.volume.calls().len(), 1);
}

#[test]
fn test_hardware_only_output_passes_volume_keys_through() {
    let e = engine();
    e.volume.set_software_control(false);
    e.manager.start().unwrap();

    let verdict = e.backend.inject(press(NX_KEYTYPE_SOUND_UP));

    assert_eq!(verdict, Some(TapVerdict::PassThrough));
    assert!(e.volume.calls().is_empty());
}

// ── Tap-disabled recovery ─────────────────────────────────────────────────────

#[test]
fn test_timeout_disable_is_recovered_and_processing_continues() {
    // Arrange
    let e = engine();
    e.manager.start().unwrap();

    // Act
    assert!(e.backend.disable_by_timeout());
    let verdict = e.backend.inject(press(NX_KEYTYPE_SOUND_UP));

    // Assert
    assert!(e.manager.is_running());
    assert!(e.backend.is_enabled());
    assert_eq!(verdict, Some(TapVerdict::Suppress));
    assert_eq!(e.volume.increases(), 1);
    assert_eq!(e.manager.stats().transient_reenables, 1);
}

#[test]
fn test_user_input_disable_with_grants_present_is_recovered() {
    let e = engine();
    e.manager.start().unwrap();

    assert!(e.backend.disable_by_user_input());

    assert!(e.manager.is_running());
    assert!(e.backend.is_enabled());
}

#[test]
fn test_revoked_grant_stops_engine_and_later_events_are_untouched() {
    // Arrange
    let e = engine();
    e.manager.start().unwrap();
    e.permissions.set_accessibility(false);

    // Act
    e.backend.disable_by_user_input();
    let verdict = e.backend.inject(press(NX_KEYTYPE_SOUND_UP));

    // Assert
    assert!(!e.manager.is_running());
    assert_eq!(verdict, None);
    assert!(e.volume.calls().is_empty());
    assert_eq!(e.manager.stats().revocation_stops, 1);
}

#[test]
fn test_engine_restarts_once_grant_returns() {
    let e = engine();
    e.manager.start().unwrap();
    e.permissions.set_accessibility(false);
    e.backend.disable_by_timeout();
    assert!(!e.manager.is_running());

    e.permissions.set_accessibility(true);
    e.manager.start().unwrap();

    assert!(e.manager.is_running());
    assert_eq!(e.backend.created_count(), 2);
    assert_eq!(e.backend.running_count(), 1);
    assert_eq!(
        e.backend.inject(press(NX_KEYTYPE_SOUND_UP)),
        Some(TapVerdict::Suppress)
    );
}

#[test]
fn test_revocation_seen_inside_tap_loop_stops_engine() {
    // Arrange
    let e = engine();
    e.manager.start().unwrap();
    e.permissions.set_input_monitoring(false);

    // Act
    let returned = e
        .backend
        .disable_on_tap_thread(TapNotice::DisabledByTimeout);

    // Assert
    assert!(returned);
    assert!(!e.manager.is_running());
    assert_eq!(e.backend.running_count(), 0);
    assert_eq!(e.manager.stats().revocation_stops, 1);
    assert_eq!(e.backend.inject(press(NX_KEYTYPE_SOUND_UP)), None);
    assert!(e.volume.calls().is_empty());
}

// ── Primary-thread executor ───────────────────────────────────────────────────

#[test]
fn test_stalled_primary_thread_fails_open() {
    // Arrange: the queue is never drained, so decoding cannot finish.
    let (queue, _main_loop) = main_thread_channel();
    let e = engine_with(MockTapBackend::new(), Arc::new(queue));
    e.manager.start().unwrap();

    // Act
    let verdict = e.backend.inject(press(NX_KEYTYPE_SOUND_UP));

    // Assert
    assert_eq!(verdict, Some(TapVerdict::PassThrough));
    assert!(e.volume.calls().is_empty());
}

#[test]
fn test_controller_calls_run_on_the_primary_thread_loop() {
    // Arrange
    let (queue, main_loop) = main_thread_channel();
    let primary = thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        runtime.block_on(main_loop.run());
    });
    let e = engine_with(MockTapBackend::new(), Arc::new(queue));
    e.manager.start().unwrap();

    // Act
    let verdict = e.backend.inject(press(NX_KEYTYPE_SOUND_UP));

    // Assert
    assert_eq!(verdict, Some(TapVerdict::Suppress));
    assert!(wait_until(|| e.volume.increases() == 1));

    drop(e);
    primary.join().expect("primary loop exits once the queue is dropped");
}
