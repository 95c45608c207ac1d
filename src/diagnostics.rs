// ABOUTME: Diagnostics accumulator for non-fatal warnings during a fleet run.
// ABOUTME: Shared by concurrent host tasks; warnings are printed once the run ends.

use parking_lot::Mutex;

/// Collects non-fatal warnings from any number of host tasks.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Mutex<Vec<Warning>>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.lock().push(warning);
    }

    /// Snapshot of the collected warnings in arrival order.
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.lock().is_empty()
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::LockRelease,
            message: message.into(),
        }
    }

    pub fn ssh_disconnect(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SshDisconnect,
            message: message.into(),
        }
    }

    pub fn missing_target(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::MissingTarget,
            message: message.into(),
        }
    }

    pub fn hook(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Hook,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Lock file may remain on the host.
    LockRelease,
    SshDisconnect,
    /// A routed role had nothing running to register with the proxy.
    MissingTarget,
    /// A non-fatal hook failed.
    Hook,
}
