// ABOUTME: Failures of proxy operations on one host.
// ABOUTME: Each variant maps to a kind so callers match without parsing messages.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::HealthOutcome;
use crate::exec::{ExecError, ExecErrorKind};
use crate::types::ProxyVersion;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(
        "kamal-proxy version {detected} is too old, please reboot to update to at least {required}"
    )]
    VersionIncompatible {
        detected: String,
        required: ProxyVersion,
    },

    #[error("{container} on {host} {outcome} after {attempts} attempt(s)")]
    HealthGateFailed {
        host: String,
        container: String,
        outcome: HealthOutcome,
        attempts: u32,
    },

    #[error(transparent)]
    Transport(#[from] ExecError),

    #[error("{0}")]
    GuardDenied(String),

    #[error(
        "{container} was not registered; the previous container is parked as {replaced_as}: {source}"
    )]
    PartialSwapFailure {
        container: String,
        replaced_as: String,
        #[source]
        source: Box<ProxyError>,
    },

    #[error("deploy lock held by {holder} (pid {pid}) since {since}; use --break-lock to override")]
    LockHeld {
        holder: String,
        pid: u32,
        since: DateTime<Utc>,
    },

    #[error("deploy lock error: {0}")]
    Lock(String),

    #[error("{name} hook failed: {reason}")]
    Hook { name: &'static str, reason: String },

    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput { command: String, output: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyErrorKind {
    VersionIncompatible,
    HealthGateFailed,
    /// The command could not be delivered.
    Transport,
    /// The command ran and failed.
    CommandFailed,
    GuardDenied,
    PartialSwapFailure,
    Lock,
    Hook,
    UnexpectedOutput,
}

impl ProxyError {
    pub fn kind(&self) -> ProxyErrorKind {
        match self {
            ProxyError::VersionIncompatible { .. } => ProxyErrorKind::VersionIncompatible,
            ProxyError::HealthGateFailed { .. } => ProxyErrorKind::HealthGateFailed,
            ProxyError::Transport(e) => match e.kind() {
                ExecErrorKind::Transport => ProxyErrorKind::Transport,
                ExecErrorKind::NonZeroExit => ProxyErrorKind::CommandFailed,
            },
            ProxyError::GuardDenied(_) => ProxyErrorKind::GuardDenied,
            ProxyError::PartialSwapFailure { .. } => ProxyErrorKind::PartialSwapFailure,
            ProxyError::LockHeld { .. } | ProxyError::Lock(_) => ProxyErrorKind::Lock,
            ProxyError::Hook { .. } => ProxyErrorKind::Hook,
            ProxyError::UnexpectedOutput { .. } => ProxyErrorKind::UnexpectedOutput,
        }
    }

    pub(crate) fn lock(message: impl Into<String>) -> Self {
        ProxyError::Lock(message.into())
    }
}
