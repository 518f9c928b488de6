//! mediakeys-agent library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

pub mod application;
pub mod infrastructure;

pub use application::feature_flags::SharedFeatureFlags;
pub use application::interceptor::{Interception, MediaKeyInterceptor};
pub use application::permission_gate::{Grant, PermissionError, PermissionGate};
pub use application::tap_manager::{
    EventTapManager, TapDisruption, TapError, TapSettings, TapStats,
};
