// ABOUTME: Fleet-level entry points behind each CLI command.
// ABOUTME: Wraps per-host work in the chosen strategy, with hooks and locks where needed.

use snafu::ResultExt;

use super::error::{HostError, Phase, StepSnafu};
use super::lock::DeployLock;
use super::{DeploymentPlan, Fleet, Mode, Operation, Report, run_host, strategy};
use crate::command::{Cmd, HostCommands, ProxyInstance};
use crate::diagnostics::Warning;
use crate::error::{Error, Result};
use crate::exec::ExecError;
use crate::hooks::{HookContext, HookPoint, HookRunner};
use crate::proxy::{ProxyError, RemovalGuard, ignore_missing};
use crate::types::Host;

/// Boot, reboot or upgrade every host in the plan.
///
/// Reboot runs the proxy hooks: around the whole fleet in parallel mode,
/// around each host in rolling mode.
pub async fn deploy_proxy(
    fleet: &Fleet<'_>,
    plan: &DeploymentPlan,
    hooks: Option<&HookRunner>,
) -> Result<Report> {
    let hooks = hooks.filter(|_| plan.operation == Operation::Reboot);

    match (hooks, plan.mode) {
        (Some(hooks), Mode::Parallel) => {
            let context = hook_context(fleet, plan, &plan.hosts);
            if let Some(reason) = run_hook(hooks, HookPoint::PreProxyReboot, &context).await {
                return Err(Error::Hook {
                    name: HookPoint::PreProxyReboot.filename(),
                    reason,
                });
            }

            let report = strategy::run(plan.mode, &plan.hosts, |host| run_host(fleet, plan, host)).await;
            post_hook(fleet, hooks, &context).await;
            Ok(report)
        }
        (Some(hooks), Mode::Rolling) => Ok(strategy::run(plan.mode, &plan.hosts, |host| async move {
            let context = hook_context(fleet, plan, std::slice::from_ref(host));
            if let Some(reason) = run_hook(hooks, HookPoint::PreProxyReboot, &context).await {
                return Err(ProxyError::Hook {
                    name: HookPoint::PreProxyReboot.filename(),
                    reason,
                })
                .context(StepSnafu {
                    host: host.to_string(),
                    phase: Phase::Hook,
                });
            }

            run_host(fleet, plan, host).await?;
            post_hook(fleet, hooks, &context).await;
            Ok(())
        })
        .await),
        (None, mode) => Ok(strategy::run(mode, &plan.hosts, |host| run_host(fleet, plan, host)).await),
    }
}

fn hook_context(fleet: &Fleet<'_>, plan: &DeploymentPlan, hosts: &[Host]) -> HookContext {
    HookContext {
        service: fleet.config.service.clone(),
        hosts: hosts.iter().map(Host::to_string).collect(),
        command: plan.operation.to_string(),
    }
}

/// Failure reason when the hook exists and failed.
async fn run_hook(hooks: &HookRunner, point: HookPoint, context: &HookContext) -> Option<String> {
    hooks
        .run(point, context)
        .await
        .filter(|result| !result.success)
        .map(|result| result.failure_reason())
}

async fn post_hook(fleet: &Fleet<'_>, hooks: &HookRunner, context: &HookContext) {
    if let Some(reason) = run_hook(hooks, HookPoint::PostProxyReboot, context).await {
        fleet.diagnostics.warn(Warning::hook(format!(
            "{} hook failed: {reason}",
            HookPoint::PostProxyReboot.filename()
        )));
    }
}

/// Run one command per host in parallel and report per host.
async fn on_each(fleet: &Fleet<'_>, hosts: &[Host], phase: Phase, build: impl Fn(&Host) -> Cmd) -> Report {
    strategy::run(Mode::Parallel, hosts, |host| {
        let cmd = build(host);
        async move {
            fleet
                .executor
                .capture(host, &cmd)
                .await
                .map_err(ProxyError::from)
                .context(StepSnafu {
                    host: host.to_string(),
                    phase,
                })?;
            Ok(())
        }
    })
    .await
}

pub async fn start(fleet: &Fleet<'_>, hosts: &[Host]) -> Report {
    on_each(fleet, hosts, Phase::Control, |host| fleet.proxy_commands(host).start()).await
}

pub async fn stop(fleet: &Fleet<'_>, hosts: &[Host]) -> Report {
    on_each(fleet, hosts, Phase::Control, |host| fleet.proxy_commands(host).stop()).await
}

/// Stop then start; hosts whose stop failed are not started.
pub async fn restart(fleet: &Fleet<'_>, hosts: &[Host]) -> Report {
    on_each(fleet, hosts, Phase::Control, |host| {
        let proxy = fleet.proxy_commands(host);
        proxy.stop().and(proxy.start())
    })
    .await
}

pub async fn remove_container(fleet: &Fleet<'_>, hosts: &[Host]) -> Report {
    on_each(fleet, hosts, Phase::Removal, |host| {
        fleet.proxy_commands(host).remove_containers()
    })
    .await
}

pub async fn remove_image(fleet: &Fleet<'_>, hosts: &[Host]) -> Report {
    on_each(fleet, hosts, Phase::Removal, |host| fleet.proxy_commands(host).remove_images()).await
}

pub async fn remove_host_directory(fleet: &Fleet<'_>, hosts: &[Host]) -> Report {
    on_each(fleet, hosts, Phase::Removal, |_| HostCommands.remove_proxy_dir()).await
}

/// Tear the proxy down on every host the guard allows.
pub async fn remove(fleet: &Fleet<'_>, hosts: &[Host], force: bool) -> Report {
    strategy::run(Mode::Parallel, hosts, |host| remove_host(fleet, host, force)).await
}

async fn remove_host(fleet: &Fleet<'_>, host: &Host, force: bool) -> std::result::Result<(), HostError> {
    let lock = DeployLock::acquire(fleet.executor, host, "remove", fleet.break_lock)
        .await
        .context(StepSnafu {
            host: host.to_string(),
            phase: Phase::Lock,
        })?;

    let result = async {
        RemovalGuard::new(fleet.executor, &fleet.config.service)
            .ensure_removable(host, force)
            .await?;

        let executor = fleet.executor;
        let proxy = fleet.proxy_commands(host);
        let instance = ProxyInstance::parse(&executor.capture(host, &proxy.inspect()).await?);
        if instance.is_running() {
            ignore_missing(executor.capture(host, &proxy.stop()).await)?;
        }
        executor.capture(host, &proxy.remove_containers()).await?;
        executor.capture(host, &proxy.remove_images()).await?;
        executor
            .capture(host, &HostCommands.remove_proxy_dir())
            .await?;
        Ok::<_, ProxyError>(())
    }
    .await
    .context(StepSnafu {
        host: host.to_string(),
        phase: Phase::Removal,
    });

    if let Err(e) = lock.release().await {
        fleet
            .diagnostics
            .warn(Warning::lock_release(format!("{host}: {e}")));
    }
    result
}

/// What each host's runtime says about the proxy container, in host order.
pub async fn details(fleet: &Fleet<'_>, hosts: &[Host]) -> Vec<(Host, std::result::Result<String, ExecError>)> {
    let results = futures::future::join_all(
        hosts
            .iter()
            .map(|host| async move { fleet.executor.capture(host, &fleet.proxy_commands(host).info()).await }),
    )
    .await;

    hosts.iter().cloned().zip(results).collect()
}
