// ABOUTME: Rename-then-replace handover of a routed role to a new container.
// ABOUTME: The proxy switches traffic in one registration; predecessors are stopped only afterwards.

use std::time::Duration;

use super::{Clock, ProxyError, ignore_missing, replaced_name};
use crate::command::{
    AppCommands, Cmd, HostCommands, ProxyCommands, env_file_contents, parse_records, serving_container,
};
use crate::exec::Executor;
use crate::types::{ContainerId, Host, ImageRef, ServiceName};

/// What to start for one role.
#[derive(Debug, Clone, Copy)]
pub struct SwapRequest<'a> {
    pub role: &'a str,
    pub image: &'a ImageRef,
    pub env: &'a [(String, String)],
    pub command: Option<&'a [String]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub name: String,
    pub container: ContainerId,
    /// Where the previous holder of `name` was parked, if there was one.
    pub replaced: Option<String>,
    /// Predecessors stopped after registration, oldest first.
    pub stopped: Vec<ContainerId>,
}

pub struct ContainerSwapper<'a> {
    executor: &'a dyn Executor,
    clock: &'a dyn Clock,
    service: &'a ServiceName,
    app: AppCommands<'a>,
    proxy: ProxyCommands<'a>,
    drain_timeout: Duration,
}

impl<'a> ContainerSwapper<'a> {
    pub fn new(
        executor: &'a dyn Executor,
        clock: &'a dyn Clock,
        service: &'a ServiceName,
        app: AppCommands<'a>,
        proxy: ProxyCommands<'a>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            executor,
            clock,
            service,
            app,
            proxy,
            drain_timeout,
        }
    }

    pub async fn swap(&self, host: &Host, request: SwapRequest<'_>) -> Result<SwapOutcome, ProxyError> {
        let name = self
            .service
            .container_name(request.role, request.image.version());

        self.executor
            .capture(host, &HostCommands.ensure_app_dir(self.service))
            .await?;
        self.executor
            .upload(
                host,
                &HostCommands.write_env_file(self.service, request.role),
                env_file_contents(request.env).as_bytes(),
            )
            .await?;

        let replaced = self.park_existing(host, &name).await?;

        let container = match self.start_and_register(host, &name, request).await {
            Ok(container) => container,
            Err(source) => {
                return Err(match replaced {
                    Some(replaced_as) => ProxyError::PartialSwapFailure {
                        container: name,
                        replaced_as,
                        source: Box::new(source),
                    },
                    None => source,
                });
            }
        };

        let stopped = self.retire_predecessors(host, request.role, &container).await?;

        tracing::info!(host = %host, container = %name, "swapped");
        Ok(SwapOutcome {
            name,
            container,
            replaced,
            stopped,
        })
    }

    /// Register the newest running container of `role` that is not parked.
    ///
    /// Returns `None` when the role has nothing running on the host.
    pub async fn reregister(&self, host: &Host, role: &str) -> Result<Option<ContainerId>, ProxyError> {
        let running = parse_records(&self.executor.capture(host, &self.app.running(role)).await?);
        let Some(current) = serving_container(running) else {
            return Ok(None);
        };

        self.executor
            .capture(host, &self.proxy.deploy(&self.service.proxy_service(role), &current.id))
            .await?;
        Ok(Some(current.id))
    }

    /// Free `name` by renaming whatever holds it, running or not.
    async fn park_existing(&self, host: &Host, name: &str) -> Result<Option<String>, ProxyError> {
        let existing = self.lookup(host, name).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let parked = replaced_name(name, self.clock);
        self.executor
            .capture(host, &self.app.rename(name, &parked))
            .await?;
        tracing::info!(host = %host, from = name, to = %parked, "renamed existing container");
        Ok(Some(parked))
    }

    async fn start_and_register(
        &self,
        host: &Host,
        name: &str,
        request: SwapRequest<'_>,
    ) -> Result<ContainerId, ProxyError> {
        let run = self.app.run(request.role, request.image, request.command);
        self.executor.capture(host, &run).await?;

        let container = self
            .lookup(host, name)
            .await?
            .ok_or_else(|| ProxyError::UnexpectedOutput {
                command: self.app.container_id(name).redacted(),
                output: String::new(),
            })?;

        let deploy = self
            .proxy
            .deploy(&self.service.proxy_service(request.role), &container);
        self.executor.capture(host, &deploy).await?;

        Ok(container)
    }

    /// Stop every other running container of the role once in-flight requests drain.
    async fn retire_predecessors(
        &self,
        host: &Host,
        role: &str,
        current: &ContainerId,
    ) -> Result<Vec<ContainerId>, ProxyError> {
        let running = parse_records(&self.executor.capture(host, &self.app.running(role)).await?);
        // Listings are newest first.
        let old: Vec<ContainerId> = running
            .into_iter()
            .rev()
            .map(|record| record.id)
            .filter(|id| id.short() != current.short())
            .collect();

        if old.is_empty() {
            return Ok(old);
        }

        tokio::time::sleep(self.drain_timeout).await;
        ignore_missing(self.executor.capture(host, &self.app.stop(&old)).await)?;
        Ok(old)
    }

    async fn lookup(&self, host: &Host, name: &str) -> Result<Option<ContainerId>, ProxyError> {
        let cmd: Cmd = self.app.container_id(name);
        let output = self.executor.capture(host, &cmd).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(ContainerId::new))
    }
}
