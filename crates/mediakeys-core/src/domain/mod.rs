//! Domain value types shared by the classifier, the router and the agent.
//!
//! This module contains pure data with no infrastructure dependencies.
//!
//! # Why keep these OS-independent? (for beginners)
//!
//! The engine runs inside a macOS event tap, but nothing about *deciding*
//! whether a volume key should be swallowed needs macOS.  Keeping the flag
//! set, the modifier set, and the display identifier as plain Rust values
//! means the whole decision path can be unit-tested on any platform, and the
//! OS adapters in the agent crate only have to translate native values into
//! these types at the boundary.

/// Live feature switches consulted on every routing decision.
pub mod flags;

/// Modifier keys held at the moment of a hardware event.
pub mod modifiers;

/// Opaque identifier for the display a key press targets.
pub mod display;

pub use display::DisplayRef;
pub use flags::FeatureFlags;
pub use modifiers::ModifierSet;
