//! Application layer of the media key agent.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (the pure `mediakeys_core` rules) and the infrastructure (CoreGraphics,
//! AppKit, config files).
//!
//! Code in this layer:
//!
//! - **Orchestrates** the core's `classify` and `route` around a live event
//!   tap.
//! - **Depends on abstractions** (the traits in [`ports`] and the tap seam in
//!   `infrastructure::event_tap`) so tests run without any OS facility.
//! - **Makes no OS calls of its own**.
//!
//! # Sub-modules
//!
//! - **`tap_manager`**     – Starts and stops the single event tap, and
//!   recovers it when the OS disables it.
//! - **`interceptor`**     – Runs on every tapped event: decode, classify,
//!   route, dispatch.  The hot path.
//! - **`permission_gate`** – Live check of the two OS grants a tap needs.
//! - **`feature_flags`**   – Atomically shared flag values the host can flip
//!   while the tap runs.
//! - **`ports`**           – Collaborator traits (controllers, permissions,
//!   primary-thread executor, display lookup).

pub mod feature_flags;
pub mod interceptor;
pub mod permission_gate;
pub mod ports;
pub mod tap_manager;
