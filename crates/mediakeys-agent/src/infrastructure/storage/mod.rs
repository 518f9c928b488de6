//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate directory.
//! - Providing sensible defaults when the file does not exist (first run).
//! - Rejecting tap settings the engine cannot use.
//!
//! The agent never writes configuration back; live changes go through
//! `SharedFeatureFlags`.

pub mod config;
