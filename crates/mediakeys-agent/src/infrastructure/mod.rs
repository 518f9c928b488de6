//! Infrastructure layer for the media key agent.
//!
//! Contains OS-facing adapters: the CoreGraphics event tap, permission
//! queries, the primary-thread executor, display lookup, controller
//! stand-ins, and config file storage.
//!
//! **Dependency rule**: this layer implements the traits in
//! `application::ports`.  The only infrastructure items the application layer
//! names are the platform-neutral tap seam types in [`event_tap`].

pub mod controllers;
pub mod display;
pub mod event_tap;
pub mod main_thread;
pub mod permissions;
pub mod storage;
