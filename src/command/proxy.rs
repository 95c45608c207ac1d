// ABOUTME: Commands that control the proxy container on a host.
// ABOUTME: Run, start, stop, inspect, deploy-target registration, logs and pruning.

use super::{Cmd, format_duration, host::PROXY_CONFIG_DIR};
use crate::config::ProxySettings;
use crate::runtime::RuntimeType;
use crate::types::{ContainerId, ImageRef, ProxyVersion, VersionError};

/// Binary inside the proxy image that accepts control commands.
const PROXY_BINARY: &str = "kamal-proxy";
const CONTAINER_CONFIG_DIR: &str = "/home/kamal-proxy/.config/kamal-proxy";
const CONTAINER_SOCKET: &str = "/var/run/docker.sock";
/// Image label of the proxy portico's predecessors ran.
const LEGACY_PROXY_LABEL: &str = "label=org.opencontainers.image.title=Traefik";
const TAIL_LINES: usize = 100;
const FOLLOW_TAIL_LINES: usize = 10;

/// Builds proxy commands for one host's runtime.
#[derive(Debug, Clone, Copy)]
pub struct ProxyCommands<'a> {
    settings: &'a ProxySettings,
    runtime: RuntimeType,
}

impl<'a> ProxyCommands<'a> {
    pub fn new(settings: &'a ProxySettings, runtime: RuntimeType) -> Self {
        Self { settings, runtime }
    }

    fn runtime_cmd(&self) -> Cmd {
        Cmd::new(self.runtime.binary())
    }

    fn name(&self) -> &str {
        &self.settings.container_name
    }

    fn name_filter(&self) -> String {
        format!("name=^{}$", self.name())
    }

    fn label_filter(&self) -> String {
        format!("label={}", self.settings.image_label)
    }

    /// Create and start a new proxy container.
    pub fn run(&self, image: &ImageRef) -> Cmd {
        let socket = self
            .settings
            .control_socket
            .clone()
            .unwrap_or_else(|| default_socket(self.runtime).to_string());

        self.runtime_cmd()
            .args(["run", "--name", self.name()])
            .args(["--network", self.settings.network.as_str()])
            .args(["--detach", "--restart", "unless-stopped"])
            .arg("--publish")
            .arg(format!("{0}:{0}", self.settings.http_port))
            .arg("--publish")
            .arg(format!("{0}:{0}", self.settings.https_port))
            .arg("--volume")
            .arg(format!("{socket}:{CONTAINER_SOCKET}"))
            .arg("--volume")
            .home_with_suffix(PROXY_CONFIG_DIR, format!(":{CONTAINER_CONFIG_DIR}"))
            .arg("--log-opt")
            .arg(format!("max-size={}", self.settings.log_max_size))
            .arg(image.to_string())
    }

    pub fn start(&self) -> Cmd {
        self.runtime_cmd().args(["container", "start", self.name()])
    }

    /// Start the existing container, creating it only if start fails.
    pub fn start_or_run(&self, image: &ImageRef) -> Cmd {
        self.start().or(self.run(image))
    }

    pub fn stop(&self) -> Cmd {
        self.runtime_cmd().args(["container", "stop", self.name()])
    }

    /// Human-readable container listing for `details`.
    pub fn info(&self) -> Cmd {
        self.runtime_cmd().args(["ps", "--filter"]).arg(self.name_filter())
    }

    /// One line `<state> <image>` when the proxy container exists, nothing otherwise.
    pub fn inspect(&self) -> Cmd {
        self.runtime_cmd()
            .args(["container", "ls", "--all", "--filter"])
            .arg(self.name_filter())
            .args(["--format", "{{.State}} {{.Image}}"])
    }

    /// Register `target` as the active container for `app`.
    pub fn deploy(&self, app: &str, target: &ContainerId) -> Cmd {
        let settings = self.settings;
        let mut cmd = self
            .runtime_cmd()
            .args(["exec", self.name(), PROXY_BINARY, "deploy", app])
            .arg("--target")
            .arg(format!("{}:{}", target.short(), settings.app_port))
            .arg("--deploy-timeout")
            .arg(format_duration(settings.deploy_timeout));

        if settings.buffer_requests {
            cmd = cmd.arg("--buffer-requests");
        }
        if settings.buffer_responses {
            cmd = cmd.arg("--buffer-responses");
        }
        for header in &settings.log_request_headers {
            cmd = cmd.arg("--log-request-header").arg(header.as_str());
        }
        for host in &settings.hosts {
            cmd = cmd.arg("--host").arg(host.as_str());
        }
        if settings.tls {
            cmd = cmd.arg("--tls");
        }
        cmd
    }

    pub fn logs(&self, options: &LogOptions) -> Cmd {
        let lines = options.lines.unwrap_or(if options.follow {
            FOLLOW_TAIL_LINES
        } else {
            TAIL_LINES
        });
        let mut cmd = self
            .runtime_cmd()
            .args(["logs", self.name(), "--timestamps"])
            .arg("--tail")
            .arg(lines.to_string());
        if let Some(since) = &options.since {
            cmd = cmd.arg("--since").arg(since.as_str());
        }
        if options.follow {
            cmd = cmd.arg("--follow");
        }
        let cmd = cmd.merge_stderr();
        match &options.grep {
            Some(pattern) => cmd.pipe(Cmd::new("grep").arg(pattern.as_str())),
            None => cmd,
        }
    }

    /// Remove stopped proxy containers.
    pub fn remove_containers(&self) -> Cmd {
        self.runtime_cmd()
            .args(["container", "prune", "--force", "--filter"])
            .arg(self.label_filter())
    }

    /// Remove proxy images not used by any container.
    pub fn remove_images(&self) -> Cmd {
        self.runtime_cmd()
            .args(["image", "prune", "--all", "--force", "--filter"])
            .arg(self.label_filter())
    }

    /// Stop and remove a leftover Traefik proxy; a no-op on hosts without one.
    pub fn remove_legacy_proxy(&self) -> Cmd {
        self.runtime_cmd()
            .args(["container", "stop", "traefik"])
            .then(
                self.runtime_cmd()
                    .args(["container", "prune", "--force", "--filter", LEGACY_PROXY_LABEL]),
            )
            .and(
                self.runtime_cmd()
                    .args(["image", "prune", "--all", "--force", "--filter", LEGACY_PROXY_LABEL]),
            )
    }

    /// Create the proxy network unless it already exists.
    pub fn ensure_network(&self) -> Cmd {
        let network = self.settings.network.as_str();
        self.runtime_cmd()
            .args(["network", "inspect", network])
            .op(">/dev/null")
            .merge_stderr()
            .or(self.runtime_cmd().args(["network", "create", network]))
    }

    pub fn login(&self, server: Option<&str>, username: &str, password: &str) -> Cmd {
        let mut cmd = self.runtime_cmd().arg("login");
        if let Some(server) = server {
            cmd = cmd.arg(server);
        }
        cmd.args(["-u", username, "-p"]).secret(password)
    }
}

fn default_socket(runtime: RuntimeType) -> &'static str {
    match runtime {
        RuntimeType::Docker => "/var/run/docker.sock",
        RuntimeType::Podman => "/run/podman/podman.sock",
    }
}

/// Options for `logs`.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub lines: Option<usize>,
    pub since: Option<String>,
    pub grep: Option<String>,
    pub follow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Running,
    Stopped,
}

/// What the runtime reports about the proxy container on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyInstance {
    Absent,
    Present { state: ProxyState, image: String },
}

impl ProxyInstance {
    /// Parse the output of [`ProxyCommands::inspect`].
    pub fn parse(output: &str) -> Self {
        let Some(line) = output.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return ProxyInstance::Absent;
        };

        let (state, image) = line.split_once(' ').unwrap_or((line, ""));
        let state = match state {
            "running" | "restarting" => ProxyState::Running,
            _ => ProxyState::Stopped,
        };

        ProxyInstance::Present {
            state,
            image: image.trim().to_string(),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ProxyInstance::Present { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            ProxyInstance::Present {
                state: ProxyState::Running,
                ..
            }
        )
    }

    /// The image tag the container was created from.
    pub fn tag(&self) -> Option<String> {
        match self {
            ProxyInstance::Absent => None,
            ProxyInstance::Present { image, .. } => Some(
                ImageRef::parse(image)
                    .ok()
                    .and_then(|i| i.tag().map(str::to_string))
                    .unwrap_or_else(|| image.clone()),
            ),
        }
    }

    /// The reported version; `None` when no proxy exists.
    pub fn version(&self) -> Option<Result<ProxyVersion, VersionError>> {
        self.tag().map(|tag| ProxyVersion::parse(&tag))
    }
}
