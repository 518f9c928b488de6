//! PermissionGate: decides whether the process may create an event tap.
//!
//! Two OS grants are required and either can be revoked by the user at any
//! time, so the gate never caches an answer.  Every call to
//! [`PermissionGate::check_ready`] queries the [`PermissionProvider`] again.
//!
//! The gate fails closed: the accessibility grant is checked first and a
//! denial there is reported without looking at input monitoring.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::ports::PermissionProvider;

/// An OS trust grant the engine depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Accessibility ("automation") trust.
    Accessibility,
    /// Input Monitoring.
    InputMonitoring,
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grant::Accessibility => f.write_str("accessibility"),
            Grant::InputMonitoring => f.write_str("input monitoring"),
        }
    }
}

/// Error returned when a required grant is missing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PermissionError {
    #[error("{0} permission has not been granted")]
    Denied(Grant),
}

impl PermissionError {
    /// The grant that was missing.
    pub fn grant(&self) -> Grant {
        match self {
            PermissionError::Denied(grant) => *grant,
        }
    }
}

/// Live check of both grants.  Cheap to clone.
#[derive(Clone)]
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self { provider }
    }

    /// Returns `Ok(())` only when both grants are currently held.
    pub fn check_ready(&self) -> Result<(), PermissionError> {
        if !self.provider.is_automation_trust_granted() {
            debug!("accessibility trust not granted");
            return Err(PermissionError::Denied(Grant::Accessibility));
        }
        if !self.provider.is_input_monitoring_granted() {
            debug!("input monitoring not granted");
            return Err(PermissionError::Denied(Grant::InputMonitoring));
        }
        Ok(())
    }
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
