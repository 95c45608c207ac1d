// ABOUTME: Bounded health polling for containers that gate an operation.
// ABOUTME: At most `attempts` queries with a fixed pause between them.

use std::fmt;
use std::time::Duration;

use super::ProxyError;
use crate::command::Cmd;
use crate::config::HealthConfig;
use crate::exec::{ExecError, Executor};
use crate::types::Host;

/// A single observation of a container's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Starting,
    Absent,
    /// The container runs without a health check.
    NoHealthCheck,
}

impl HealthStatus {
    /// Parse `health:<status>` or `state:<status>`; empty output means no container.
    pub fn parse(output: &str) -> Self {
        let line = output.lines().map(str::trim).find(|l| !l.is_empty());
        match line {
            None => HealthStatus::Absent,
            Some("health:healthy") => HealthStatus::Healthy,
            Some("health:unhealthy") => HealthStatus::Unhealthy,
            Some("state:running") => HealthStatus::NoHealthCheck,
            Some("state:exited") | Some("state:dead") => HealthStatus::Unhealthy,
            Some(_) => HealthStatus::Starting,
        }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthOutcome {
    Healthy,
    Unhealthy,
    /// Never settled within the allowed attempts.
    Timeout,
}

impl fmt::Display for HealthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthOutcome::Healthy => f.write_str("became healthy"),
            HealthOutcome::Unhealthy => f.write_str("reported unhealthy"),
            HealthOutcome::Timeout => f.write_str("did not become healthy"),
        }
    }
}

pub struct HealthChecker<'a> {
    executor: &'a dyn Executor,
    attempts: u32,
    interval: Duration,
}

impl<'a> HealthChecker<'a> {
    pub fn new(executor: &'a dyn Executor, config: &HealthConfig) -> Self {
        Self::with_bounds(executor, config.attempts, config.interval)
    }

    pub fn with_bounds(executor: &'a dyn Executor, attempts: u32, interval: Duration) -> Self {
        Self {
            executor,
            attempts: attempts.max(1),
            interval,
        }
    }

    /// Poll `query` until the container settles or the attempts run out.
    ///
    /// Sleeps only between attempts, so the wait never exceeds
    /// `(attempts - 1) * interval` plus the time spent in queries.
    pub async fn wait_healthy(&self, host: &Host, query: &Cmd) -> Result<HealthOutcome, ExecError> {
        for attempt in 1..=self.attempts {
            let status = HealthStatus::parse(&self.executor.capture(host, query).await?);
            tracing::debug!(host = %host, attempt, ?status, "health poll");

            match status {
                HealthStatus::Healthy | HealthStatus::NoHealthCheck => {
                    return Ok(HealthOutcome::Healthy);
                }
                HealthStatus::Unhealthy => return Ok(HealthOutcome::Unhealthy),
                HealthStatus::Starting | HealthStatus::Absent => {}
            }

            if attempt < self.attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(HealthOutcome::Timeout)
    }

    /// Wait for `container` and turn anything but healthy into a gate failure.
    pub async fn gate(&self, host: &Host, container: &str, query: &Cmd) -> Result<(), ProxyError> {
        match self.wait_healthy(host, query).await? {
            HealthOutcome::Healthy => Ok(()),
            outcome => Err(ProxyError::HealthGateFailed {
                host: host.to_string(),
                container: container.to_string(),
                outcome,
                attempts: self.attempts,
            }),
        }
    }
}
