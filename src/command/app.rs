// ABOUTME: Commands for the application containers the proxy routes to.
// ABOUTME: Lookup, rename, run, stop, remove and health inspection by role.

use super::Cmd;
use super::host::env_file;
use crate::runtime::RuntimeType;
use crate::types::{ContainerId, ImageRef, ServiceName};

const HEALTH_FORMAT: &str =
    "{{if .State.Health}}health:{{.State.Health.Status}}{{else}}state:{{.State.Status}}{{end}}";
const RECORD_FORMAT: &str = "{{.ID}} {{.Names}}";

/// Builds application container commands for one service on one runtime.
#[derive(Debug, Clone, Copy)]
pub struct AppCommands<'a> {
    service: &'a ServiceName,
    runtime: RuntimeType,
    network: &'a str,
    log_max_size: &'a str,
}

impl<'a> AppCommands<'a> {
    pub fn new(
        service: &'a ServiceName,
        runtime: RuntimeType,
        network: &'a str,
        log_max_size: &'a str,
    ) -> Self {
        Self {
            service,
            runtime,
            network,
            log_max_size,
        }
    }

    fn runtime_cmd(&self) -> Cmd {
        Cmd::new(self.runtime.binary())
    }

    fn service_label(&self) -> String {
        format!("label=service={}", self.service)
    }

    /// ID of the container with exactly this name, in any state.
    pub fn container_id(&self, name: &str) -> Cmd {
        self.runtime_cmd()
            .args(["container", "ls", "--all", "--filter"])
            .arg(format!("name=^{name}$"))
            .arg("--quiet")
    }

    pub fn rename(&self, from: &str, to: &str) -> Cmd {
        self.runtime_cmd().args(["rename", from, to])
    }

    /// Start a detached container for `role` from `image`.
    ///
    /// Application env comes from the role's env file, written beforehand
    /// with [`HostCommands::write_env_file`](super::HostCommands::write_env_file).
    pub fn run(&self, role: &str, image: &ImageRef, command: Option<&[String]>) -> Cmd {
        let version = image.version();
        let name = self.service.container_name(role, version);

        let mut cmd = self
            .runtime_cmd()
            .args(["run", "--detach", "--restart", "unless-stopped"])
            .args(["--name", name.as_str()])
            .args(["--network", self.network])
            .arg("-e")
            .arg(format!("PORTICO_CONTAINER_NAME={name}"))
            .arg("-e")
            .arg(format!("PORTICO_VERSION={version}"))
            .arg("--env-file")
            .home(env_file(self.service, role))
            .arg("--log-opt")
            .arg(format!("max-size={}", self.log_max_size))
            .arg("--label")
            .arg(format!("service={}", self.service))
            .arg("--label")
            .arg(format!("role={role}"))
            .arg("--label")
            .arg(format!("version={version}"))
            .arg(image.to_string());

        if let Some(command) = command {
            cmd = cmd.args(command.iter().map(String::as_str));
        }
        cmd
    }

    /// Running containers of `role`, newest first.
    pub fn running(&self, role: &str) -> Cmd {
        self.runtime_cmd()
            .args(["ps", "--filter"])
            .arg(self.service_label())
            .arg("--filter")
            .arg(format!("label=role={role}"))
            .args(["--filter", "status=running", "--format", RECORD_FORMAT])
    }

    /// Stopped containers of `role`, newest first.
    pub fn stopped(&self, role: &str) -> Cmd {
        self.runtime_cmd()
            .args(["ps", "--all", "--filter"])
            .arg(self.service_label())
            .arg("--filter")
            .arg(format!("label=role={role}"))
            .args([
                "--filter",
                "status=created",
                "--filter",
                "status=exited",
                "--filter",
                "status=dead",
                "--format",
                RECORD_FORMAT,
            ])
    }

    pub fn stop(&self, ids: &[ContainerId]) -> Cmd {
        self.runtime_cmd()
            .args(["container", "stop"])
            .args(ids.iter().map(ContainerId::as_str))
    }

    pub fn remove(&self, ids: &[ContainerId]) -> Cmd {
        self.runtime_cmd()
            .args(["container", "rm"])
            .args(ids.iter().map(ContainerId::as_str))
    }

    /// Remove dangling images of this service; tagged images stay for rollback.
    pub fn prune_images(&self) -> Cmd {
        self.runtime_cmd()
            .args(["image", "prune", "--force", "--filter"])
            .arg(self.service_label())
    }

    /// `health:<status>` when a health check is defined, `state:<status>` otherwise.
    pub fn health_status(&self, name: &str) -> Cmd {
        self.container_id(name).pipe(
            Cmd::new("xargs")
                .arg("-r")
                .arg(self.runtime.binary())
                .args(["inspect", "--format", HEALTH_FORMAT]),
        )
    }
}

/// One row of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub name: String,
}

impl ContainerRecord {
    /// Renamed out of the way by a swap.
    pub fn is_parked(&self) -> bool {
        self.name.contains("_replaced_")
    }
}

/// The container currently serving a role: the newest one not parked by a swap.
pub fn serving_container(records: Vec<ContainerRecord>) -> Option<ContainerRecord> {
    records.into_iter().find(|record| !record.is_parked())
}

/// Contents of a role env file, one `KEY=value` per line.
///
/// The runtime reads values verbatim, so newlines are written as `\n`.
pub fn env_file_contents(env: &[(String, String)]) -> String {
    env.iter()
        .map(|(key, value)| format!("{key}={}\n", value.replace('\n', "\\n")))
        .collect()
}

/// Parse `{{.ID}} {{.Names}}` lines, keeping the runtime's ordering.
pub fn parse_records(output: &str) -> Vec<ContainerRecord> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let id = parts.next()?;
            let name = parts.next().unwrap_or_default();
            Some(ContainerRecord {
                id: ContainerId::new(id),
                name: name.to_string(),
            })
        })
        .collect()
}
