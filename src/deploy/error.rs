// ABOUTME: Per-host failure carrying the phase it happened in.
// ABOUTME: Built with snafu context selectors at each state transition.

use snafu::Snafu;
use std::fmt;

use crate::proxy::{ProxyError, ProxyErrorKind};

/// Where in a host's sequence something failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lock,
    Hook,
    VersionCheck,
    ProxyUpdate,
    HealthGate,
    TargetSwap,
    Prune,
    Control,
    Removal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lock => "lock",
            Phase::Hook => "hook",
            Phase::VersionCheck => "version check",
            Phase::ProxyUpdate => "proxy update",
            Phase::HealthGate => "health gate",
            Phase::TargetSwap => "target swap",
            Phase::Prune => "prune",
            Phase::Control => "proxy control",
            Phase::Removal => "removal",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HostError {
    #[snafu(display("{host}: {phase} failed: {source}"))]
    Step {
        host: String,
        phase: Phase,
        source: ProxyError,
    },
}

impl HostError {
    pub fn host(&self) -> &str {
        match self {
            HostError::Step { host, .. } => host,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            HostError::Step { phase, .. } => *phase,
        }
    }

    pub fn kind(&self) -> ProxyErrorKind {
        self.cause().kind()
    }

    pub fn cause(&self) -> &ProxyError {
        match self {
            HostError::Step { source, .. } => source,
        }
    }
}
