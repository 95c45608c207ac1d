// ABOUTME: State transitions for one host's boot, reboot or upgrade sequence.
// ABOUTME: Each method consumes the rollout and returns the next state on success.

use snafu::ResultExt;

use super::error::{HostError, Phase, StepSnafu};
use super::lock::DeployLock;
use super::state::{DependentsHealthy, Done, Idle, ProxyUpdated, TargetsSwapped, VersionChecked};
use super::{DeploymentPlan, Fleet, Operation, Rollout};
use crate::command::{HostCommands, ProxyInstance, parse_records, serving_container};
use crate::diagnostics::Warning;
use crate::proxy::{ProxyError, SwapRequest, prune_role};
use crate::types::Host;

impl<S> Rollout<'_, S> {
    fn step(&self, phase: Phase) -> StepSnafu<String, Phase> {
        StepSnafu {
            host: self.host.to_string(),
            phase,
        }
    }

    /// Proxy directory, network and registry login; all idempotent.
    async fn prepare_host(&self) -> Result<(), ProxyError> {
        let executor = self.fleet.executor;
        let proxy = self.fleet.proxy_commands(self.host);

        executor
            .capture(self.host, &HostCommands.ensure_proxy_dir())
            .await?;
        executor.capture(self.host, &proxy.ensure_network()).await?;

        if let Some(login) = &self.plan.registry {
            let cmd = proxy.login(login.server.as_deref(), &login.username, &login.password);
            executor.capture(self.host, &cmd).await?;
        }
        Ok(())
    }

    /// Roles this host runs, split by whether the proxy routes to them.
    fn roles(&self, routed: bool) -> Vec<(&str, &crate::config::RoleConfig)> {
        let config = self.fleet.config;
        let roles: Vec<_> = if routed {
            config.routed_roles().collect()
        } else {
            config.dependent_roles().collect()
        };
        roles
            .into_iter()
            .filter(|(name, _)| self.host.serves(name))
            .collect()
    }
}

// =============================================================================
// Idle -> VersionChecked
// =============================================================================

impl<'a> Rollout<'a, Idle> {
    /// Refuse to continue when the running proxy or the target image is too old.
    ///
    /// Reboot skips the running proxy: replacing an outdated proxy is what it is for.
    pub async fn check_version(self) -> Result<Rollout<'a, VersionChecked>, HostError> {
        let step = self.step(Phase::VersionCheck);
        let instance = async {
            let proxy = self.fleet.proxy_commands(self.host);
            let output = self.fleet.executor.capture(self.host, &proxy.inspect()).await?;
            let instance = ProxyInstance::parse(&output);

            let gate = self.fleet.version_gate();
            if self.plan.operation != Operation::Reboot {
                gate.require_instance(&instance)?;
            }
            gate.require_image(&self.plan.proxy_image)?;
            Ok::<_, ProxyError>(instance)
        }
        .await
        .context(step)?;

        tracing::info!(host = %self.host, ?instance, "version check passed");
        Ok(self.advance(VersionChecked { instance }))
    }
}

// =============================================================================
// VersionChecked -> ProxyUpdated
// =============================================================================

impl<'a> Rollout<'a, VersionChecked> {
    pub async fn update_proxy(self) -> Result<Rollout<'a, ProxyUpdated>, HostError> {
        let step = self.step(Phase::ProxyUpdate);
        let executor = self.fleet.executor;
        let proxy = self.fleet.proxy_commands(self.host);
        let image = &self.plan.proxy_image;
        let present = self.state.instance.is_present();

        async {
            match self.plan.operation {
                Operation::Boot => {
                    self.prepare_host().await?;
                    let cmd = if present {
                        proxy.start_or_run(image)
                    } else {
                        proxy.run(image)
                    };
                    executor.capture(self.host, &cmd).await?;
                }
                Operation::Reboot => {
                    if present {
                        executor.capture(self.host, &proxy.stop()).await?;
                    }
                    executor
                        .capture(self.host, &proxy.remove_legacy_proxy())
                        .await?;
                    executor.capture(self.host, &proxy.remove_containers()).await?;
                    self.prepare_host().await?;
                    executor.capture(self.host, &proxy.run(image)).await?;
                }
                Operation::Upgrade => {
                    executor
                        .capture(self.host, &proxy.remove_legacy_proxy())
                        .await?;
                    if present {
                        executor.capture(self.host, &proxy.stop()).await?;
                    }
                    executor.capture(self.host, &proxy.remove_containers()).await?;
                    executor.capture(self.host, &proxy.remove_images()).await?;
                    self.prepare_host().await?;
                    executor
                        .capture(self.host, &proxy.start_or_run(image))
                        .await?;
                }
            }
            Ok::<_, ProxyError>(())
        }
        .await
        .context(step)?;

        tracing::info!(host = %self.host, operation = %self.plan.operation, "proxy updated");
        Ok(self.advance(ProxyUpdated))
    }
}

// =============================================================================
// ProxyUpdated -> DependentsHealthy
// =============================================================================

impl<'a> Rollout<'a, ProxyUpdated> {
    /// Wait for the container serving each non-routed role to report healthy.
    ///
    /// The serving container is the newest running one that is not parked;
    /// the configured name is only a fallback when nothing runs.
    pub async fn gate_dependents(self) -> Result<Rollout<'a, DependentsHealthy>, HostError> {
        if self.plan.operation == Operation::Boot {
            return Ok(self.advance(DependentsHealthy));
        }

        let step = self.step(Phase::HealthGate);
        let checker = self.fleet.health_checker();
        let executor = self.fleet.executor;
        let app = self.fleet.app_commands(self.host);
        let version = self.plan.app_image.version();

        async {
            for (role, _) in self.roles(false) {
                let running = parse_records(&executor.capture(self.host, &app.running(role)).await?);
                let name = serving_container(running)
                    .map(|record| record.name)
                    .unwrap_or_else(|| self.fleet.config.service.container_name(role, version));
                checker
                    .gate(self.host, &name, &app.health_status(&name))
                    .await?;
                tracing::info!(host = %self.host, container = %name, "dependent healthy");
            }
            Ok::<_, ProxyError>(())
        }
        .await
        .context(step)?;

        Ok(self.advance(DependentsHealthy))
    }
}

// =============================================================================
// DependentsHealthy -> TargetsSwapped
// =============================================================================

impl<'a> Rollout<'a, DependentsHealthy> {
    /// Upgrade swaps in new containers; reboot re-registers what is running.
    pub async fn swap_targets(self) -> Result<Rollout<'a, TargetsSwapped>, HostError> {
        let step = self.step(Phase::TargetSwap);
        let swapper = self.fleet.swapper(self.host);

        async {
            match self.plan.operation {
                Operation::Boot => {}
                Operation::Reboot => {
                    for (role, _) in self.roles(true) {
                        if swapper.reregister(self.host, role).await?.is_none() {
                            self.fleet.diagnostics.warn(Warning::missing_target(format!(
                                "{}: no running {} container to register",
                                self.host,
                                self.fleet.config.service.proxy_service(role)
                            )));
                        }
                    }
                }
                Operation::Upgrade => {
                    for (role, config) in self.roles(true) {
                        let request = SwapRequest {
                            role,
                            image: &self.plan.app_image,
                            env: &self.plan.env,
                            command: config.cmd.as_deref(),
                        };
                        swapper.swap(self.host, request).await?;
                    }
                }
            }
            Ok::<_, ProxyError>(())
        }
        .await
        .context(step)?;

        Ok(self.advance(TargetsSwapped))
    }
}

// =============================================================================
// TargetsSwapped -> Done
// =============================================================================

impl<'a> Rollout<'a, TargetsSwapped> {
    /// Apply container retention per role and drop unused application images.
    pub async fn prune(self) -> Result<Rollout<'a, Done>, HostError> {
        if self.plan.operation != Operation::Upgrade {
            return Ok(self.advance(Done));
        }

        let step = self.step(Phase::Prune);
        let executor = self.fleet.executor;
        let app = self.fleet.app_commands(self.host);
        let policy = self.fleet.pruning_policy();
        let roles: Vec<&str> = self
            .fleet
            .config
            .roles
            .keys()
            .map(String::as_str)
            .filter(|role| self.host.serves(role))
            .collect();

        async {
            for role in roles {
                prune_role(executor, self.host, &app, role, policy).await?;
            }
            executor.capture(self.host, &app.prune_images()).await?;
            Ok::<_, ProxyError>(())
        }
        .await
        .context(step)?;

        Ok(self.advance(Done))
    }
}

/// Check the proxy version, then lock the host and drive it to `Done`.
///
/// The version check only reads, so a host that fails it is never locked.
pub async fn run_host(fleet: &Fleet<'_>, plan: &DeploymentPlan, host: &Host) -> Result<(), HostError> {
    let checked = Rollout::new(fleet, plan, host).check_version().await?;

    let command = plan.operation.as_str();
    let lock = DeployLock::acquire(fleet.executor, host, command, fleet.break_lock)
        .await
        .context(StepSnafu {
            host: host.to_string(),
            phase: Phase::Lock,
        })?;

    let result = async {
        checked
            .update_proxy()
            .await?
            .gate_dependents()
            .await?
            .swap_targets()
            .await?
            .prune()
            .await
    }
    .await;

    if let Err(e) = lock.release().await {
        fleet
            .diagnostics
            .warn(Warning::lock_release(format!("{host}: {e}")));
    }

    result.map(|_| ())
}
