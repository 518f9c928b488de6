//! MediaKeys agent entry point.
//!
//! Loads configuration, wires the engine to the platform's event tap, and
//! runs the primary-thread executor until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()  (primary thread, current-thread Tokio runtime)
//!  ├─ load_config()            -- flags, tap locations, timeouts
//!  ├─ EventTapManager::start() -- spawns the "mediakeys-tap" thread
//!  └─ select!
//!       ├─ MainThreadLoop::run()  -- NSEvent decodes + controller calls
//!       ├─ retry timer            -- restarts the tap once grants return
//!       └─ ctrl_c()
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mediakeys_agent::application::ports::{PermissionProvider, VolumeController};
use mediakeys_agent::infrastructure::controllers::{RecordingBrightness, RecordingVolume};
use mediakeys_agent::infrastructure::display::platform_locator;
use mediakeys_agent::infrastructure::event_tap::TapBackend;
use mediakeys_agent::infrastructure::main_thread::main_thread_channel;
use mediakeys_agent::infrastructure::storage::config::{load_config, AppConfig};
use mediakeys_agent::{
    EventTapManager, Grant, MediaKeyInterceptor, SharedFeatureFlags, TapError,
};

/// How often a stopped engine retries `start()`.
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let loaded = load_config();
    let log_level = loaded
        .as_ref()
        .map(|cfg| cfg.agent.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "could not load config; using defaults");
        AppConfig::default()
    });

    info!("MediaKeys agent starting");

    let flags = Arc::new(SharedFeatureFlags::new(config.features));
    let (queue, main_loop) = main_thread_channel();
    let volume = Arc::new(RecordingVolume::default());
    let interceptor = MediaKeyInterceptor::new(
        Arc::clone(&volume) as Arc<dyn VolumeController>,
        Arc::new(RecordingBrightness::default()),
        flags,
        platform_locator(),
        Arc::new(queue),
    )
    .with_decode_timeout(config.tap.decode_timeout());

    let (backend, permissions) = platform_tap();
    let manager = EventTapManager::new(backend, permissions, interceptor, config.tap.settings());

    let mut prompted = false;
    try_start(&manager, &mut prompted);

    // ── Primary-thread loop ───────────────────────────────────────────────────
    let mut retry = tokio::time::interval(RETRY_INTERVAL);
    retry.tick().await;
    let run_loop = main_loop.run();
    tokio::pin!(run_loop);
    loop {
        tokio::select! {
            _ = &mut run_loop => {
                warn!("main-thread queue closed");
                break;
            }
            _ = retry.tick() => {
                if !manager.is_running() {
                    try_start(&manager, &mut prompted);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "failed to listen for Ctrl-C");
                }
                info!("shutdown signal received");
                break;
            }
        }
    }

    manager.stop();
    let stats = manager.stats();
    info!(
        seen = stats.events_seen,
        suppressed = stats.events_suppressed,
        dispatched = stats.actions_dispatched,
        reenabled = stats.transient_reenables,
        volume = volume.current_level(),
        "MediaKeys agent stopped"
    );
    Ok(())
}

/// Starts the engine, prompting for Accessibility once if that is missing.
fn try_start(manager: &EventTapManager, prompted: &mut bool) {
    match manager.start() {
        Ok(()) => info!(
            location = ?manager.active_location(),
            "MediaKeys agent ready.  Press Ctrl-C to exit."
        ),
        Err(TapError::PermissionDenied(grant)) => {
            if grant == Grant::Accessibility && !*prompted {
                *prompted = true;
                request_accessibility_prompt();
            }
            warn!(%grant, "media keys are not intercepted until the grant is given in System Settings");
        }
        Err(e) => error!(error = %e, "failed to start media key tap"),
    }
}

#[cfg(target_os = "macos")]
fn platform_tap() -> (Arc<dyn TapBackend>, Arc<dyn PermissionProvider>) {
    use mediakeys_agent::infrastructure::event_tap::macos::MacosTapBackend;
    use mediakeys_agent::infrastructure::permissions::macos::MacosPermissions;

    (Arc::new(MacosTapBackend), Arc::new(MacosPermissions))
}

#[cfg(not(target_os = "macos"))]
fn platform_tap() -> (Arc<dyn TapBackend>, Arc<dyn PermissionProvider>) {
    use mediakeys_agent::infrastructure::event_tap::mock::MockTapBackend;
    use mediakeys_agent::infrastructure::permissions::StaticPermissions;

    warn!("no system event tap on this platform; using the mock backend");
    (
        Arc::new(MockTapBackend::new()),
        Arc::new(StaticPermissions::granted()),
    )
}

#[cfg(target_os = "macos")]
fn request_accessibility_prompt() {
    use mediakeys_agent::infrastructure::permissions::macos::MacosPermissions;

    MacosPermissions.request_accessibility_prompt();
}

#[cfg(not(target_os = "macos"))]
fn request_accessibility_prompt() {}
