// ABOUTME: Refuses to tear down the proxy while other apps still use it.
// ABOUTME: Counts other services' marker directories on the host; --force skips the check.

use super::ProxyError;
use crate::command::HostCommands;
use crate::exec::Executor;
use crate::types::{Host, ServiceName};

pub const GUARD_MESSAGE: &str = "Not removing the proxy, as other apps are installed, ignore this check with portico remove --force";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny(String),
}

impl GuardDecision {
    pub fn decide(app_count: usize, force: bool) -> Self {
        if force || app_count == 0 {
            GuardDecision::Allow
        } else {
            GuardDecision::Deny(GUARD_MESSAGE.to_string())
        }
    }
}

pub struct RemovalGuard<'a> {
    executor: &'a dyn Executor,
    service: &'a ServiceName,
}

impl<'a> RemovalGuard<'a> {
    /// `service` is the app being removed; its own marker never blocks removal.
    pub fn new(executor: &'a dyn Executor, service: &'a ServiceName) -> Self {
        Self { executor, service }
    }

    pub async fn can_remove_proxy(&self, host: &Host, force: bool) -> Result<GuardDecision, ProxyError> {
        if force {
            return Ok(GuardDecision::Allow);
        }

        let cmd = HostCommands.count_other_apps(self.service);
        let output = self.executor.capture(host, &cmd).await?;
        let count = output
            .trim()
            .parse::<usize>()
            .map_err(|_| ProxyError::UnexpectedOutput {
                command: cmd.redacted(),
                output: output.clone(),
            })?;

        tracing::debug!(host = %host, count, "other installed apps");
        Ok(GuardDecision::decide(count, force))
    }

    /// Like [`can_remove_proxy`](Self::can_remove_proxy) but denial is an error.
    pub async fn ensure_removable(&self, host: &Host, force: bool) -> Result<(), ProxyError> {
        match self.can_remove_proxy(host, force).await? {
            GuardDecision::Allow => Ok(()),
            GuardDecision::Deny(reason) => Err(ProxyError::GuardDenied(reason)),
        }
    }
}
