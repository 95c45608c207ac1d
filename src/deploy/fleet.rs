// ABOUTME: Everything a host task needs that is shared across the fleet.
// ABOUTME: Config, executor, clock and diagnostics, plus per-host command builders.

use std::fmt;

use crate::command::{AppCommands, ProxyCommands};
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::exec::Executor;
use crate::proxy::{Clock, ContainerSwapper, HealthChecker, PruningPolicy, VersionGate};
use crate::types::Host;

pub struct Fleet<'a> {
    pub config: &'a Config,
    pub executor: &'a dyn Executor,
    pub clock: &'a dyn Clock,
    pub diagnostics: &'a Diagnostics,
    /// Break held deploy locks instead of failing.
    pub break_lock: bool,
}

impl fmt::Debug for Fleet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fleet")
            .field("service", &self.config.service)
            .field("break_lock", &self.break_lock)
            .finish_non_exhaustive()
    }
}

impl<'a> Fleet<'a> {
    pub fn new(
        config: &'a Config,
        executor: &'a dyn Executor,
        clock: &'a dyn Clock,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            config,
            executor,
            clock,
            diagnostics,
            break_lock: false,
        }
    }

    pub fn break_lock(mut self, break_lock: bool) -> Self {
        self.break_lock = break_lock;
        self
    }

    pub fn proxy_commands(&self, host: &Host) -> ProxyCommands<'a> {
        ProxyCommands::new(&self.config.proxy, host.container_runtime())
    }

    pub fn app_commands(&self, host: &Host) -> AppCommands<'a> {
        AppCommands::new(
            &self.config.service,
            host.container_runtime(),
            &self.config.proxy.network,
            &self.config.proxy.log_max_size,
        )
    }

    pub fn version_gate(&self) -> VersionGate {
        VersionGate::new(self.config.proxy.minimum_version.clone())
    }

    pub fn health_checker(&self) -> HealthChecker<'a> {
        HealthChecker::new(self.executor, &self.config.health)
    }

    pub fn pruning_policy(&self) -> PruningPolicy {
        PruningPolicy::new(self.config.retain_containers)
    }

    pub fn swapper(&self, host: &Host) -> ContainerSwapper<'a> {
        ContainerSwapper::new(
            self.executor,
            self.clock,
            &self.config.service,
            self.app_commands(host),
            self.proxy_commands(host),
            self.config.drain_timeout,
        )
    }
}
