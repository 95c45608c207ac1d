// ABOUTME: Decision and handover components that drive the proxy on one host.
// ABOUTME: Version gate, health polling, container swap, pruning and removal guard.

mod clock;
mod error;
mod guard;
mod health;
mod prune;
mod swap;
mod version_gate;

pub use clock::{Clock, SystemClock, replaced_name};
pub use error::{ProxyError, ProxyErrorKind};
pub use guard::{GUARD_MESSAGE, GuardDecision, RemovalGuard};
pub use health::{HealthChecker, HealthOutcome, HealthStatus};
pub use prune::{PruningPolicy, prune_role};
pub use swap::{ContainerSwapper, SwapOutcome, SwapRequest};
pub use version_gate::{GateDecision, VersionGate};

use crate::exec::ExecError;

/// Treat "already gone" as done so removals can be repeated.
pub(crate) fn ignore_missing(result: Result<String, ExecError>) -> Result<(), ExecError> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_missing_resource() => {
            tracing::debug!(host = e.host(), "resource already removed");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
